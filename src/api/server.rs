//! Server lifecycle: bind, serve, shut down on Ctrl-C.

use std::net::SocketAddr;

use crate::api::router::build_router;
use crate::api::types::ApiContext;
use crate::db::DatabaseError;
use crate::trends::SignalTableError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Clinical signal table error: {0}")]
    Signals(#[from] SignalTableError),
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(ctx: ApiContext, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local = listener.local_addr().map_err(ServerError::Serve)?;

    let app = build_router(ctx);
    tracing::info!(addr = %local, "API server started");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("API server received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("API server stopped");
    Ok(())
}
