#[tokio::main]
async fn main() {
    if let Err(e) = carediary::run().await {
        tracing::error!("Carediary failed: {e}");
        eprintln!("carediary: {e}");
        std::process::exit(1);
    }
}
