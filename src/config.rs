//! Runtime configuration for the news client
//!
//! Holds the API endpoint, pacing, cache lifetime, and timeout settings, plus
//! lookup of the API key from the environment.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::error::ConfigError;

/// Base URL for the NewsAPI v2 REST API
pub const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

/// Environment variables checked for the API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["NEWSAPI_KEY", "NEWS_API_KEY"];

/// Directory used when no XDG cache directory can be determined
const FALLBACK_CACHE_DIR: &str = ".news_cache";

/// Configuration for a `NewsClient`
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL that endpoint names are appended to
    pub base_url: String,
    /// Minimum spacing between upstream calls
    pub rate_limit_interval: Duration,
    /// Maximum age at which a cached response is still served
    pub cache_ttl: Duration,
    /// Upper bound on a single upstream call
    pub request_timeout: Duration,
    /// Where cached responses live; `None` means the default location
    pub cache_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: NEWS_API_BASE_URL.to_string(),
            rate_limit_interval: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(300), // 5 minutes
            request_timeout: Duration::from_secs(30),
            cache_dir: None,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    /// Returns the configured cache directory, or the default one
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(Self::default_cache_dir)
    }

    /// XDG-compliant cache directory (`~/.cache/newsfetch/` on Linux)
    ///
    /// Falls back to `.news_cache` in the working directory when there is no
    /// home directory to anchor the XDG path.
    pub fn default_cache_dir() -> PathBuf {
        ProjectDirs::from("", "", "newsfetch")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
    }
}

/// Reads the API key from `NEWSAPI_KEY`, then `NEWS_API_KEY`
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(|name| std::env::var(name).ok())
}

/// Resolves the API key through an arbitrary variable lookup
///
/// Empty values are treated as unset.
pub fn api_key_from<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey)
}
