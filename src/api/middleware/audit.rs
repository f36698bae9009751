//! Access logging middleware.
//!
//! Logs method, path and status of every request. Share tokens travel in
//! the path, so share routes are logged by their route pattern.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

const SHARE_PREFIX: &str = "/api/share/";

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = loggable_path(req.uri().path());

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        "API request"
    );
    response
}

fn loggable_path(path: &str) -> String {
    if path.starts_with(SHARE_PREFIX) || path.starts_with("/share/") {
        return format!("{SHARE_PREFIX}:token");
    }
    path.to_string()
}
