//! Storage collaborator seen by the engine.
//!
//! The engine only needs raw blobs in and canonical records out, so the
//! seam is a small object-safe trait. [`SqliteStore`] is the bundled
//! implementation; tests and embedders may supply their own.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use serde_json::Value;

use super::{repository, DatabaseError};
use crate::models::case::CaseRecord;
use crate::models::case_profile::CaseProfile;
use crate::normalize::{normalize_cases, normalize_profile};
use crate::profile_cache::ProfileCache;

pub trait CaseStore: Send + Sync {
    /// Raw case blobs for one profile.
    fn load_cases(&self, case_id: u32) -> Result<Vec<Value>, DatabaseError>;
    /// Raw blob of one case by its id, `None` if unknown.
    fn load_case(&self, id: &str) -> Result<Option<Value>, DatabaseError>;
    /// Raw case blobs for every profile.
    fn load_all_cases(&self) -> Result<Vec<Value>, DatabaseError>;
    fn save_case(&self, case: &CaseRecord) -> Result<(), DatabaseError>;
    /// Raw profile blob, `None` if the profile was never saved.
    fn load_profile(&self, case_id: u32) -> Result<Option<Value>, DatabaseError>;
    /// Replace the stored profile, share token included, atomically.
    fn save_profile(&self, profile: &CaseProfile) -> Result<(), DatabaseError>;
    /// Profile owning exactly this token.
    fn resolve_share_token(&self, token: &str) -> Result<Option<u32>, DatabaseError>;
}

// ═══════════════════════════════════════════
// SQLite implementation
// ═══════════════════════════════════════════

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(super::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(super::open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl CaseStore for SqliteStore {
    fn load_cases(&self, case_id: u32) -> Result<Vec<Value>, DatabaseError> {
        let conn = self.conn()?;
        repository::list_case_bodies(&conn, case_id)
    }

    fn load_case(&self, id: &str) -> Result<Option<Value>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_case_body(&conn, id)
    }

    fn load_all_cases(&self) -> Result<Vec<Value>, DatabaseError> {
        let conn = self.conn()?;
        repository::list_all_case_bodies(&conn)
    }

    fn save_case(&self, case: &CaseRecord) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::upsert_case(&conn, case)
    }

    fn load_profile(&self, case_id: u32) -> Result<Option<Value>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_profile_body(&conn, case_id)
    }

    fn save_profile(&self, profile: &CaseProfile) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::upsert_profile(&conn, profile)
    }

    fn resolve_share_token(&self, token: &str) -> Result<Option<u32>, DatabaseError> {
        let conn = self.conn()?;
        repository::find_case_id_by_share_token(&conn, token)
    }
}

// ═══════════════════════════════════════════
// Engine-side helpers
// ═══════════════════════════════════════════

/// Normalized cases for one profile, newest first.
pub fn load_case_records(store: &dyn CaseStore, case_id: u32) -> Result<Vec<CaseRecord>, DatabaseError> {
    Ok(normalize_cases(&store.load_cases(case_id)?))
}

/// Normalized profile, created with defaults and persisted on first read.
/// The activity block is recomputed from `cases`.
pub fn load_or_create_profile(
    store: &dyn CaseStore,
    case_id: u32,
    cases: &[CaseRecord],
) -> Result<CaseProfile, DatabaseError> {
    match store.load_profile(case_id)? {
        Some(raw) => {
            let mut profile = normalize_profile(&raw, Some(cases), None);
            profile.case_id = case_id;
            Ok(profile)
        }
        None => {
            let profile = normalize_profile(&serde_json::json!({ "caseId": case_id }), Some(cases), None);
            store.save_profile(&profile)?;
            tracing::info!(case_id, "Created default profile");
            Ok(profile)
        }
    }
}

/// Profile (through `cache`) and cases for one request.
pub fn load_profile_with_cases(
    store: &dyn CaseStore,
    cache: &ProfileCache,
    case_id: u32,
) -> Result<(CaseProfile, Vec<CaseRecord>), DatabaseError> {
    let cases = load_case_records(store, case_id)?;
    let profile = cache.get_or_load(case_id, || load_or_create_profile(store, case_id, &cases))?;
    Ok((profile, cases))
}

/// Persist `profile` and drop its cache entry before returning.
pub fn save_profile_and_invalidate(
    store: &dyn CaseStore,
    cache: &ProfileCache,
    profile: &CaseProfile,
) -> Result<(), DatabaseError> {
    store.save_profile(profile)?;
    cache.invalidate(profile.case_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disclosure::{issue_share_token, revoke_share_token};
    use crate::models::enums::PrivacyMode;
    use crate::normalize::normalize_case;
    use serde_json::json;

    #[test]
    fn profile_is_materialized_on_first_read() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_profile(3).unwrap().is_none());

        let profile = load_or_create_profile(&store, 3, &[]).unwrap();
        assert_eq!(profile.case_id, 3);
        assert_eq!(profile.privacy_mode, PrivacyMode::Private);
        assert!(store.load_profile(3).unwrap().is_some());
    }

    #[test]
    fn activity_comes_from_cases() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (id, when) in [("a", "2026-01-05T10:00:00"), ("b", "2026-02-09T10:00:00")] {
            store
                .save_case(&normalize_case(&json!({ "id": id, "eventDatetime": when })))
                .unwrap();
        }
        let cache = ProfileCache::default();
        let (profile, cases) = load_profile_with_cases(&store, &cache, 1).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(profile.activity.case_count, 2);
        assert_eq!(profile.activity.first_event_date.as_deref(), Some("2026-01-05"));
        assert_eq!(profile.activity.last_event_date.as_deref(), Some("2026-02-09"));
    }

    #[test]
    fn saving_profile_invalidates_cache() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cache = ProfileCache::default();
        let (profile, _) = load_profile_with_cases(&store, &cache, 1).unwrap();
        assert_eq!(cache.len().unwrap(), 1);

        let mut public = profile.clone();
        public.privacy_mode = PrivacyMode::Public;
        save_profile_and_invalidate(&store, &cache, &public).unwrap();
        assert!(cache.is_empty().unwrap());

        let (reloaded, _) = load_profile_with_cases(&store, &cache, 1).unwrap();
        assert_eq!(reloaded.privacy_mode, PrivacyMode::Public);
    }

    #[test]
    fn single_case_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save_case(&normalize_case(&json!({ "id": "k-1", "titleZh": "散步" })))
            .unwrap();
        assert_eq!(store.load_case("k-1").unwrap().unwrap()["titleZh"], "散步");
        assert!(store.load_case("missing").unwrap().is_none());
    }

    #[test]
    fn reissued_token_replaces_old_one() {
        let store = SqliteStore::open_in_memory().unwrap();
        let profile = load_or_create_profile(&store, 1, &[]).unwrap();

        let first = issue_share_token(&profile);
        store.save_profile(&first).unwrap();
        let old = first.share_token.clone().unwrap();
        assert_eq!(store.resolve_share_token(&old).unwrap(), Some(1));

        let second = issue_share_token(&first);
        store.save_profile(&second).unwrap();
        assert_eq!(store.resolve_share_token(&old).unwrap(), None);

        store.save_profile(&revoke_share_token(&second)).unwrap();
        assert_eq!(store.resolve_share_token(second.share_token.as_deref().unwrap()).unwrap(), None);
    }
}
