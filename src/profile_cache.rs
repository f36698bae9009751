//! Short-lived profile cache.
//!
//! Memoizes normalized profile reads for a fixed TTL (5 minutes by
//! default) so repeated requests skip the store. It is an explicit
//! object handed to request-scoped calls, not global state.
//!
//! Key properties:
//! - Entries expire `ttl` after they were fetched
//! - Every profile write must call [`ProfileCache::invalidate`] before
//!   returning, so a lowered privacy level is visible on the next read
//! - The lock is never held while loading from the store, and a load
//!   that overlaps an invalidation of the same case is not cached

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::PROFILE_CACHE_TTL_SECS;
use crate::models::case_profile::CaseProfile;

// ═══════════════════════════════════════════════════════════
// CachedProfile: one memoized read
// ═══════════════════════════════════════════════════════════

struct CachedProfile {
    profile: CaseProfile,
    fetched_at: Instant,
}

impl CachedProfile {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

// ═══════════════════════════════════════════════════════════
// ProfileCache
// ═══════════════════════════════════════════════════════════

/// Entries plus per-case generations. `invalidate` bumps the case's
/// generation and `clear` bumps `epoch`; a load that raced either one
/// is returned to its caller but not cached.
#[derive(Default)]
struct CacheState {
    entries: HashMap<u32, CachedProfile>,
    generations: HashMap<u32, u64>,
    epoch: u64,
}

impl CacheState {
    fn stamp(&self, case_id: u32) -> (u64, u64) {
        (self.epoch, self.generations.get(&case_id).copied().unwrap_or(0))
    }
}

pub struct ProfileCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ProfileCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CacheState>, ProfileCacheError> {
        self.state.lock().map_err(|_| ProfileCacheError::LockPoisoned)
    }

    // ── Reads ────────────────────────────────────────────

    /// Fresh cached profile, if any. Expired entries are evicted.
    pub fn get(&self, case_id: u32) -> Result<Option<CaseProfile>, ProfileCacheError> {
        self.get_at(case_id, Instant::now())
    }

    pub fn get_at(&self, case_id: u32, now: Instant) -> Result<Option<CaseProfile>, ProfileCacheError> {
        let mut state = self.lock()?;
        match state.entries.get(&case_id) {
            Some(entry) if entry.is_fresh(now, self.ttl) => Ok(Some(entry.profile.clone())),
            Some(_) => {
                state.entries.remove(&case_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Cached profile, or the result of `load` (which is then cached).
    /// Load failures are returned and nothing is cached. A load that
    /// overlaps an [`invalidate`](Self::invalidate) of the same case is
    /// returned but not cached.
    pub fn get_or_load<E, F>(&self, case_id: u32, load: F) -> Result<CaseProfile, E>
    where
        E: From<ProfileCacheError>,
        F: FnOnce() -> Result<CaseProfile, E>,
    {
        let stamp = {
            let state = self.lock()?;
            if let Some(entry) = state.entries.get(&case_id) {
                if entry.is_fresh(Instant::now(), self.ttl) {
                    return Ok(entry.profile.clone());
                }
            }
            state.stamp(case_id)
        };

        let profile = load()?;

        let mut state = self.lock()?;
        if state.stamp(case_id) == stamp {
            state.entries.insert(
                case_id,
                CachedProfile {
                    profile: profile.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(case_id, "Profile invalidated during load, not cached");
        }
        Ok(profile)
    }

    // ── Writes ───────────────────────────────────────────

    pub fn insert(&self, profile: CaseProfile) -> Result<(), ProfileCacheError> {
        self.insert_at(profile, Instant::now())
    }

    pub fn insert_at(&self, profile: CaseProfile, fetched_at: Instant) -> Result<(), ProfileCacheError> {
        let mut state = self.lock()?;
        state.entries.insert(profile.case_id, CachedProfile { profile, fetched_at });
        Ok(())
    }

    /// Drop the entry for `case_id` and fence out in-flight loads of it.
    /// Returns whether an entry was present.
    pub fn invalidate(&self, case_id: u32) -> Result<bool, ProfileCacheError> {
        let mut state = self.lock()?;
        *state.generations.entry(case_id).or_insert(0) += 1;
        let removed = state.entries.remove(&case_id).is_some();
        if removed {
            tracing::debug!(case_id, "Profile cache entry invalidated");
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<(), ProfileCacheError> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.epoch += 1;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, ProfileCacheError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, ProfileCacheError> {
        Ok(self.len()? == 0)
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(PROFILE_CACHE_TTL_SECS))
    }
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ProfileCacheError {
    #[error("Profile cache lock poisoned")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
