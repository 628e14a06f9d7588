use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_BIND: &str = "127.0.0.1:3146";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Default)]
pub struct TmdbSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl TmdbSettings {
    pub fn is_complete(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }
}

/// What to do with records that reappear on a later page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Keep,
    DropRepeated,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub duplicates: DuplicatePolicy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            duplicates: DuplicatePolicy::Keep,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tmdb: TmdbSettings,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub search: SearchSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tmdb = TmdbSettings {
            base_url: var("TMDB_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            api_key: var("TMDB_API_KEY"),
        };

        let data_dir = var("MOVIEMANIA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let bind_addr = var("MOVIEMANIA_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("MOVIEMANIA_BIND is not a valid socket address")?;

        let debounce_ms = match var("SEARCH_DEBOUNCE_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("SEARCH_DEBOUNCE_MS must be a number, got '{raw}'"))?,
            None => DEFAULT_DEBOUNCE_MS,
        };

        let duplicates = match var("SEARCH_DEDUPE_PAGES").as_deref() {
            Some(v) if matches!(v.to_lowercase().as_str(), "1" | "true" | "yes") => {
                DuplicatePolicy::DropRepeated
            }
            _ => DuplicatePolicy::Keep,
        };

        Ok(Self {
            tmdb,
            data_dir,
            bind_addr,
            search: SearchSettings {
                debounce: Duration::from_millis(debounce_ms),
                duplicates,
            },
        })
    }

    /// Reports missing catalog settings. The app keeps running without them;
    /// every remote fetch then fails into the regular error path.
    pub fn log_summary(&self) {
        for (key, present) in [
            ("TMDB_BASE_URL", self.tmdb.base_url.is_some()),
            ("TMDB_API_KEY", self.tmdb.api_key.is_some()),
        ] {
            if !present {
                warn!("Missing environment variable {}: remote fetches will fail", key);
            }
        }
        if self.tmdb.is_complete() {
            info!("All catalog environment variables are set");
        }
        info!(
            "Favourites stored under {:?}, search debounce {:?}, duplicates {:?}",
            self.data_dir, self.search.debounce, self.search.duplicates
        );
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
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("config");
        assert!(!config.tmdb.is_complete());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.search.debounce, Duration::from_millis(300));
        assert_eq!(config.search.duplicates, DuplicatePolicy::Keep);
    }

    #[test]
    fn reads_all_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TMDB_BASE_URL", "https://api.themoviedb.org/3/"),
            ("TMDB_API_KEY", "secret"),
            ("MOVIEMANIA_DATA_DIR", "/tmp/mm"),
            ("MOVIEMANIA_BIND", "0.0.0.0:8080"),
            ("SEARCH_DEBOUNCE_MS", "50"),
            ("SEARCH_DEDUPE_PAGES", "true"),
        ]))
        .expect("config");
        assert_eq!(
            config.tmdb.base_url.as_deref(),
            Some("https://api.themoviedb.org/3")
        );
        assert_eq!(config.tmdb.api_key.as_deref(), Some("secret"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mm"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.search.debounce, Duration::from_millis(50));
        assert_eq!(config.search.duplicates, DuplicatePolicy::DropRepeated);
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[("TMDB_API_KEY", "  ")])).expect("config");
        assert!(config.tmdb.api_key.is_none());
    }

    #[test]
    fn rejects_bad_debounce() {
        assert!(AppConfig::from_lookup(lookup(&[("SEARCH_DEBOUNCE_MS", "soon")])).is_err());
    }
}
