//! NewsAPI client
//!
//! `NewsClient` ties together request normalization, the response cache, the
//! rate limiter, the HTTP transport, and response classification behind a
//! single `fetch` operation.

mod classify;
mod rate_limit;
mod transport;

pub use classify::classify;
pub use rate_limit::RateLimiter;
pub use transport::{HttpTransport, RawResponse, Transport};

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{generate_key, CacheManager, ResponseStore};
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::request::{compact, Endpoint, NewsQuery, Params};

/// Query parameter carrying the API key
const API_KEY_PARAM: &str = "apiKey";

/// Client for fetching news from NewsAPI
///
/// Each client owns its own rate limiter and cache handle; independent clients
/// never throttle each other.
pub struct NewsClient {
    api_key: String,
    base_url: String,
    transport: Box<dyn Transport>,
    cache: Option<Box<dyn ResponseStore>>,
    limiter: RateLimiter,
}

impl NewsClient {
    /// Creates a client with the HTTP transport and, when `use_cache` is set,
    /// a file cache in the configured directory
    pub fn new(
        api_key: impl Into<String>,
        config: &ApiConfig,
        use_cache: bool,
    ) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config.request_timeout)?;
        let cache = use_cache.then(|| {
            Box::new(CacheManager::new(
                config.resolved_cache_dir(),
                config.cache_ttl,
            )) as Box<dyn ResponseStore>
        });
        Ok(Self::with_parts(api_key, config, Box::new(transport), cache))
    }

    /// Creates a client from explicit parts
    ///
    /// Useful for tests, or to back the cache with something other than files.
    pub fn with_parts(
        api_key: impl Into<String>,
        config: &ApiConfig,
        transport: Box<dyn Transport>,
        cache: Option<Box<dyn ResponseStore>>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transport,
            cache,
            limiter: RateLimiter::new(config.rate_limit_interval),
        }
    }

    /// Whether responses are being cached
    pub fn caching_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Fetches `endpoint` with the given parameters
    ///
    /// Absent parameters are dropped and the API key is added before the cache
    /// key is computed, so clients with different keys never share entries. A
    /// cache hit returns immediately without touching the rate limiter. On a
    /// miss the call waits for the rate limiter, goes upstream once, and only a
    /// successful payload is cached.
    pub async fn fetch(&self, endpoint: &str, params: Params) -> Result<Value, FetchError> {
        let mut normalized = compact(&params);
        normalized.insert(API_KEY_PARAM.to_string(), self.api_key.clone());

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| generate_key(endpoint, &normalized));

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(payload) = cache.get(key) {
                debug!(endpoint, "using cached response");
                return Ok(payload);
            }
            debug!(endpoint, "cache miss");
        }

        self.limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        info!(endpoint, params = ?redacted(&normalized), "requesting");

        let query: Vec<(String, String)> = normalized.into_iter().collect();
        let response = self.transport.get(&url, &query).await?;
        let payload = classify(response)?;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            cache.set(key, &payload);
        }

        Ok(payload)
    }

    /// Fetches articles from `top-headlines` or `everything`
    pub async fn fetch_news(
        &self,
        endpoint: Endpoint,
        query: &NewsQuery,
    ) -> Result<Value, FetchError> {
        let response = self
            .fetch(endpoint.as_str(), query.to_params(endpoint))
            .await?;

        debug!(
            total_results = response["totalResults"].as_u64().unwrap_or(0),
            articles = response["articles"].as_array().map_or(0, Vec::len),
            "articles fetched"
        );

        Ok(response)
    }

    /// Lists available news sources, optionally filtered
    pub async fn get_sources(
        &self,
        category: Option<&str>,
        language: Option<&str>,
        country: Option<&str>,
    ) -> Result<Value, FetchError> {
        let query = NewsQuery {
            category: category.map(str::to_string),
            language: language.map(str::to_string),
            country: country.map(str::to_string),
            ..Default::default()
        };
        self.fetch(Endpoint::Sources.as_str(), query.to_params(Endpoint::Sources))
            .await
    }

    /// Removes every cached response
    pub fn clear_cache(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.clear())
    }

    /// Removes cached responses older than the TTL
    pub fn clear_expired(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.clear_expired())
    }
}

/// Parameters with the API key removed, for logging
fn redacted(params: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    params
        .iter()
        .filter(|(name, _)| name.as_str() != API_KEY_PARAM)
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant, SystemTime};
    use tempfile::TempDir;

    /// A request the scripted transport received
    #[derive(Debug, Clone)]
    struct Call {
        url: String,
        query: Vec<(String, String)>,
        at: Instant,
    }

    /// Transport that replays queued outcomes and records each call
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        outcomes: Arc<Mutex<VecDeque<Result<RawResponse, FetchError>>>>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl ScriptedTransport {
        fn push_body(&self, status: u16, body: &str) {
            self.outcomes.lock().unwrap().push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
        }

        fn push_error(&self, err: FetchError) {
            self.outcomes.lock().unwrap().push_back(Err(err));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
        ) -> Result<RawResponse, FetchError> {
            self.calls.lock().unwrap().push(Call {
                url: url.to_string(),
                query: query.to_vec(),
                at: Instant::now(),
            });
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(RawResponse {
                        status: 200,
                        body: r#"{"status":"ok","totalResults":0,"articles":[]}"#.to_string(),
                    })
                })
        }
    }

    fn test_config() -> ApiConfig {
        ApiConfig::default()
            .with_base_url("http://news.test/v2/")
            .with_rate_limit_interval(Duration::ZERO)
    }

    fn file_client(
        transport: &ScriptedTransport,
        config: &ApiConfig,
        dir: &Path,
    ) -> NewsClient {
        let cache = CacheManager::new(dir.to_path_buf(), config.cache_ttl);
        NewsClient::with_parts(
            "test-key",
            config,
            Box::new(transport.clone()),
            Some(Box::new(cache)),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some((*v).into())))
            .collect()
    }

    /// Pushes the mtime of every cache file `secs` seconds into the past
    fn age_cache_files(dir: &Path, secs: u64) {
        for entry in fs::read_dir(dir).unwrap() {
            let file = fs::File::options()
                .write(true)
                .open(entry.unwrap().path())
                .unwrap();
            file.set_modified(SystemTime::now() - Duration::from_secs(secs))
                .unwrap();
        }
    }

    fn cache_file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map_or(0, |d| d.count())
    }

    #[tokio::test]
    async fn test_identical_fetches_hit_upstream_once() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        let client = file_client(&transport, &test_config(), temp_dir.path());

        let first = client
            .fetch("top-headlines", params(&[("q", "ai"), ("country", "us")]))
            .await
            .unwrap();
        let second = client
            .fetch("top-headlines", params(&[("country", "us"), ("q", "ai")]))
            .await
            .unwrap();

        assert_eq!(transport.calls().len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ttl_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        transport.push_body(200, r#"{"status":"ok","totalResults":1,"articles":[{"title":"first"}]}"#);
        transport.push_body(200, r#"{"status":"ok","totalResults":1,"articles":[{"title":"second"}]}"#);
        let config = test_config().with_cache_ttl(Duration::from_secs(300));
        let client = file_client(&transport, &config, temp_dir.path());

        // t=0: miss, one upstream call, entry stored
        let at_zero = client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(cache_file_count(temp_dir.path()), 1);

        // t=10: hit, no upstream call, identical payload
        age_cache_files(temp_dir.path(), 10);
        let at_ten = client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(at_ten, at_zero);

        // t=301: stale, new upstream call, new entry
        age_cache_files(temp_dir.path(), 301);
        let at_301 = client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(at_301["articles"][0]["title"], "second");

        let again = client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(again, at_301);
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced_and_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        transport.push_body(
            401,
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#,
        );
        let client = file_client(&transport, &test_config(), temp_dir.path());

        let err = client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap_err();

        match &err {
            FetchError::Upstream { code, message } => {
                assert_eq!(code, "apiKeyInvalid");
                assert_eq!(message, "Your API key is invalid");
            }
            other => panic!("Expected upstream error, got {:?}", other),
        }
        assert_eq!(cache_file_count(temp_dir.path()), 0);

        // Nothing was cached, so the retry goes upstream again
        client
            .fetch("top-headlines", params(&[("q", "ai")]))
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let transport = ScriptedTransport::default();
        transport.push_error(FetchError::Transport("connection refused".to_string()));
        let client =
            NewsClient::with_parts("k", &test_config(), Box::new(transport.clone()), None);

        let err = client
            .fetch("everything", params(&[("q", "rust")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        transport.push_body(200, "<html>maintenance</html>");
        let client = file_client(&transport, &test_config(), temp_dir.path());

        let err = client
            .fetch("everything", params(&[("q", "rust")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(cache_file_count(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_uncached_calls_are_rate_limited() {
        let transport = ScriptedTransport::default();
        let config = test_config().with_rate_limit_interval(Duration::from_millis(150));
        let client = NewsClient::with_parts("k", &config, Box::new(transport.clone()), None);

        client.fetch("everything", params(&[("q", "a")])).await.unwrap();
        client.fetch("everything", params(&[("q", "a")])).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].at.duration_since(calls[0].at) >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_rate_limit() {
        let transport = ScriptedTransport::default();
        let config = test_config().with_rate_limit_interval(Duration::from_secs(5));
        let cache = MemoryCache::new(config.cache_ttl);
        let client =
            NewsClient::with_parts("k", &config, Box::new(transport.clone()), Some(Box::new(cache)));

        client.fetch("everything", params(&[("q", "a")])).await.unwrap();
        let start = Instant::now();
        client.fetch("everything", params(&[("q", "a")])).await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_api_key_is_sent_and_partitions_cache() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        let config = test_config();

        let cache_a = CacheManager::new(temp_dir.path().to_path_buf(), config.cache_ttl);
        let cache_b = CacheManager::new(temp_dir.path().to_path_buf(), config.cache_ttl);
        let client_a =
            NewsClient::with_parts("key-a", &config, Box::new(transport.clone()), Some(Box::new(cache_a)));
        let client_b =
            NewsClient::with_parts("key-b", &config, Box::new(transport.clone()), Some(Box::new(cache_b)));

        client_a.fetch("sources", Params::new()).await.unwrap();
        client_b.fetch("sources", Params::new()).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].url, "http://news.test/v2/sources");
        assert!(calls[0]
            .query
            .contains(&("apiKey".to_string(), "key-a".to_string())));
        assert!(calls[1]
            .query
            .contains(&("apiKey".to_string(), "key-b".to_string())));
        assert_eq!(cache_file_count(temp_dir.path()), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_goes_upstream() {
        let transport = ScriptedTransport::default();
        let client = NewsClient::with_parts("k", &test_config(), Box::new(transport.clone()), None);

        assert!(!client.caching_enabled());
        client.fetch("everything", params(&[("q", "a")])).await.unwrap();
        client.fetch("everything", params(&[("q", "a")])).await.unwrap();

        assert_eq!(transport.calls().len(), 2);
        assert_eq!(client.clear_cache(), 0);
    }

    #[tokio::test]
    async fn test_absent_params_are_dropped() {
        let transport = ScriptedTransport::default();
        let client = NewsClient::with_parts("k", &test_config(), Box::new(transport.clone()), None);

        let mut raw = params(&[("q", "ai")]);
        raw.insert("country".to_string(), None);
        client.fetch("top-headlines", raw).await.unwrap();

        let calls = transport.calls();
        let query = &calls[0].query;
        assert!(query.iter().all(|(name, _)| name != "country"));
        assert!(query.contains(&("q".to_string(), "ai".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_news_applies_endpoint_rules() {
        let transport = ScriptedTransport::default();
        let client = NewsClient::with_parts("k", &test_config(), Box::new(transport.clone()), None);
        let query = NewsQuery {
            country: Some("us".to_string()),
            sources: Some("bbc-news".to_string()),
            page_size: Some(20),
            ..Default::default()
        };

        client
            .fetch_news(Endpoint::TopHeadlines, &query)
            .await
            .unwrap();

        let calls = transport.calls();
        let call = &calls[0];
        assert_eq!(call.url, "http://news.test/v2/top-headlines");
        assert!(call.query.iter().all(|(name, _)| name != "country"));
        assert!(call
            .query
            .contains(&("pageSize".to_string(), "20".to_string())));
    }

    #[tokio::test]
    async fn test_get_sources_uses_sources_endpoint() {
        let transport = ScriptedTransport::default();
        transport.push_body(200, r#"{"status":"ok","sources":[{"id":"bbc-news"}]}"#);
        let client = NewsClient::with_parts("k", &test_config(), Box::new(transport.clone()), None);

        let payload = client
            .get_sources(Some("general"), None, Some("gb"))
            .await
            .unwrap();

        assert_eq!(payload["sources"][0]["id"], "bbc-news");
        let calls = transport.calls();
        let call = &calls[0];
        assert_eq!(call.url, "http://news.test/v2/sources");
        assert!(call
            .query
            .contains(&("category".to_string(), "general".to_string())));
    }

    #[tokio::test]
    async fn test_clear_cache_through_client() {
        let temp_dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        let client = file_client(&transport, &test_config(), temp_dir.path());

        client.fetch("everything", params(&[("q", "a")])).await.unwrap();
        client.fetch("everything", params(&[("q", "b")])).await.unwrap();
        age_cache_files(temp_dir.path(), 1000);
        client.fetch("everything", params(&[("q", "c")])).await.unwrap();

        assert_eq!(client.clear_expired(), 2);
        assert_eq!(client.clear_cache(), 1);
        assert_eq!(cache_file_count(temp_dir.path()), 0);
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let params = BTreeMap::from([
            ("apiKey".to_string(), "secret".to_string()),
            ("q".to_string(), "ai".to_string()),
        ]);

        let shown = redacted(&params);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown.get("q"), Some(&"ai"));
    }
}
