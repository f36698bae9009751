//! Shared request context for the HTTP surface.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::EngineConfig;
use crate::db::CaseStore;
use crate::models::case::DEFAULT_CASE_ID;
use crate::profile_cache::ProfileCache;
use crate::trends::SignalTable;

/// Shared state for all API handlers.
///
/// Handlers receive it through `State`; middleware reads it from the
/// `Extension` layer.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn CaseStore>,
    pub cache: Arc<ProfileCache>,
    pub config: Arc<EngineConfig>,
    pub signals: Arc<SignalTable>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn CaseStore>, config: EngineConfig, signals: SignalTable) -> Self {
        Self {
            store,
            cache: Arc::new(ProfileCache::new(config.profile_cache_ttl)),
            config: Arc::new(config),
            signals: Arc::new(signals),
        }
    }
}

/// `?caseId=` selector shared by owner routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseQuery {
    pub case_id: Option<u32>,
}

impl CaseQuery {
    pub fn case_id(&self) -> u32 {
        self.case_id.filter(|id| *id > 0).unwrap_or(DEFAULT_CASE_ID)
    }
}
