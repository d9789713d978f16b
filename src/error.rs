//! Error types for newsfetch
//!
//! `FetchError` is the only error a caller of `NewsClient::fetch` ever sees.
//! Cache problems are absorbed inside the cache module and never reach it.

use thiserror::Error;

/// Broad failure category, for callers that branch on the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure before a body was available
    Transport,
    /// A body arrived but was not valid JSON
    Decode,
    /// A valid body whose status field reports failure
    Upstream,
}

/// Errors that can occur while fetching from the news API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or an unusable HTTP response
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response body is not valid JSON
    #[error("Invalid JSON response from API: {0}")]
    Decode(String),

    /// The API answered with `status: "error"`
    #[error("API Error ({code}): {message}")]
    Upstream { code: String, message: String },
}

impl FetchError {
    /// Returns the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Decode(_) => ErrorKind::Decode,
            FetchError::Upstream { .. } => ErrorKind::Upstream,
        }
    }

    /// Returns the upstream error code, if the API supplied one
    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Upstream { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("timed out: {}", err)
        } else {
            err.to_string()
        };
        FetchError::Transport(detail)
    }
}

/// Errors raised by cache storage internals
///
/// These never escape `ResponseStore::get` or `ResponseStore::set`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors raised while assembling runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NewsAPI key not found. Please set NEWSAPI_KEY or NEWS_API_KEY environment variable.")]
    MissingApiKey,
}
