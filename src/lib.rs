pub mod api;
pub mod classify;
pub mod clinical;
pub mod config;
pub mod db;
pub mod disclosure;
pub mod feed;
pub mod models;
pub mod normalize;
pub mod profile_cache;
pub mod signals;
pub mod trends;
pub mod validation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, ServerError};
use crate::config::EngineConfig;
use crate::db::SqliteStore;
use crate::trends::SignalTable;

pub async fn run() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Carediary starting v{}", config::APP_VERSION);

    let config = EngineConfig::from_env();

    let signals = match &config.signals_path {
        Some(path) => {
            let table = SignalTable::load(path)?;
            tracing::info!(path = %path.display(), "Loaded clinical signal table");
            table
        }
        None => SignalTable::bundled(),
    };

    let store = SqliteStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Database opened");

    if config.owner_token.is_none() {
        tracing::warn!("CAREDIARY_OWNER_TOKEN is not set; owner routes are unauthenticated");
    }

    let addr = config.bind_addr;
    let ctx = ApiContext::new(Arc::new(store), config, signals);
    api::serve(ctx, addr).await
}
