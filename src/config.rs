use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Carediary";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default clinical-summary lookback.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Profile reads are memoized for this long.
pub const PROFILE_CACHE_TTL_SECS: u64 = 300;

/// A tag is "rising" when its 7-day count exceeds this share of its 30-day count.
/// Kept as-is for output compatibility; it has no clinical validation.
pub const RISING_THRESHOLD: f64 = 0.6;

/// Severity/emotion weight of one danger keyword.
pub const DANGER_WEIGHT: u32 = 3;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_PHOTO_BASE_URL: &str = "/uploads";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,carediary=debug".to_string()
}

/// Get the application data directory
/// ~/Carediary/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn database_path() -> PathBuf {
    app_data_dir().join("carediary.db")
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    /// When set, owner routes require `Authorization: Bearer <token>`.
    pub owner_token: Option<String>,
    pub window_days: u32,
    pub photo_base_url: String,
    pub profile_cache_ttl: Duration,
    /// JSON clinical-signal table; the bundled table is used when unset.
    pub signals_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8787))),
            database_path: database_path(),
            owner_token: None,
            window_days: DEFAULT_WINDOW_DAYS,
            photo_base_url: DEFAULT_PHOTO_BASE_URL.to_string(),
            profile_cache_ttl: Duration::from_secs(PROFILE_CACHE_TTL_SECS),
            signals_path: None,
        }
    }
}

impl EngineConfig {
    /// Read `CAREDIARY_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(raw) = get("CAREDIARY_BIND") {
            match raw.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid CAREDIARY_BIND"),
            }
        }
        if let Some(raw) = get("CAREDIARY_DB") {
            config.database_path = PathBuf::from(raw);
        }
        config.owner_token = get("CAREDIARY_OWNER_TOKEN");
        if let Some(raw) = get("CAREDIARY_WINDOW_DAYS") {
            match raw.parse::<u32>() {
                Ok(days) if days > 0 => config.window_days = days,
                _ => tracing::warn!(value = %raw, "Ignoring invalid CAREDIARY_WINDOW_DAYS"),
            }
        }
        if let Some(raw) = get("CAREDIARY_PHOTO_BASE_URL") {
            config.photo_base_url = raw.trim_end_matches('/').to_string();
        }
        config.signals_path = get("CAREDIARY_SIGNALS").map(PathBuf::from);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Carediary"));
        assert!(database_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_without_env() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config.window_days, 30);
        assert_eq!(config.profile_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.bind_addr.port(), 8787);
        assert!(config.owner_token.is_none());
        assert!(config.signals_path.is_none());
    }

    #[test]
    fn env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CAREDIARY_BIND", "0.0.0.0:9000"),
            ("CAREDIARY_OWNER_TOKEN", "secret"),
            ("CAREDIARY_WINDOW_DAYS", "14"),
            ("CAREDIARY_PHOTO_BASE_URL", "https://cdn.example.org/p/"),
            ("CAREDIARY_SIGNALS", "/etc/carediary/signals.json"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.owner_token.as_deref(), Some("secret"));
        assert_eq!(config.window_days, 14);
        assert_eq!(config.photo_base_url, "https://cdn.example.org/p");
        assert!(config.signals_path.is_some());
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CAREDIARY_BIND", "not an address"),
            ("CAREDIARY_WINDOW_DAYS", "0"),
            ("CAREDIARY_OWNER_TOKEN", "   "),
        ]));
        assert_eq!(config.bind_addr.port(), 8787);
        assert_eq!(config.window_days, 30);
        assert!(config.owner_token.is_none());
    }
}
