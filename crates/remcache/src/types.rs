//! Data types shared by resolvers, fetchers and callers.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

use crate::error::{BatchError, CacheError};
use crate::options::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};

/// Diagnostics of one fetch attempt that reached the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchInfo {
    /// URL the request was sent to.
    pub url: String,

    /// HTTP status code of the response.
    pub status: u16,

    /// Time from sending the request until the response was handled.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// When the attempt started.
    pub fetched_at: DateTime<Utc>,
}

impl FetchInfo {
    /// Record an attempt that just finished after `duration`; `fetched_at`
    /// is back-dated by `duration` to when it started.
    pub fn new(url: impl Into<String>, status: u16, duration: Duration) -> Self {
        let now = Utc::now();
        let fetched_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|elapsed| now.checked_sub_signed(elapsed))
            .unwrap_or(now);
        Self::started_at(url, status, duration, fetched_at)
    }

    /// Record an attempt with an explicit start time.
    pub fn started_at(
        url: impl Into<String>,
        status: u16,
        duration: Duration,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            duration,
            fetched_at,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
}

/// Body and diagnostics of a successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Bytes,
    pub info: FetchInfo,
}

/// Outcome of a batch fetch.
///
/// Every key in `bodies` is also in `infos` with status 200. `infos` may hold
/// keys that are missing from `bodies`: those got a response that failed at
/// the HTTP level.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Payloads of the keys that succeeded.
    pub bodies: HashMap<String, Bytes>,

    /// Diagnostics of every key whose request got a response.
    pub infos: HashMap<String, FetchInfo>,

    /// One cause per failing key; `None` iff every key succeeded.
    pub error: Option<BatchError>,
}

impl BatchResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the mappings, failing if any key failed.
    pub fn into_result(
        self,
    ) -> Result<(HashMap<String, Bytes>, HashMap<String, FetchInfo>), BatchError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.bodies, self.infos)),
        }
    }
}

/// Seed request that resolvers customize per key.
///
/// Carries everything except the URL: method, headers, an optional body and
/// extra query pairs appended to every resolved URL.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    query: Vec<(String, String)>,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestTemplate {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header from strings, validating both parts.
    pub fn try_with_header(self, name: &str, value: &str) -> Result<Self, CacheError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CacheError::config(format!("invalid header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CacheError::config(format!("invalid header value for {}: {}", name, e)))?;
        Ok(self.with_header(name, value))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build a concrete request for `url` from this template.
    pub fn build(&self, mut url: Url) -> reqwest::Request {
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        let mut request = reqwest::Request::new(self.method.clone(), url);
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        request
    }
}

/// Serializable part of the remote configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Request timeout in seconds (0 means default).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum in-flight requests per batch (0 means default).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// User-Agent sent by the default transport.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_concurrency: default_max_concurrency(),
            user_agent: None,
        }
    }
}

impl RemoteConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `REMCACHE_TIMEOUT` | Request timeout in seconds |
    /// | `REMCACHE_MAX_CONCURRENCY` | In-flight requests per batch |
    /// | `REMCACHE_USER_AGENT` | User-Agent header |
    pub fn from_env() -> Self {
        Self {
            timeout_secs: std::env::var("REMCACHE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_concurrency: std::env::var("REMCACHE_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_concurrency),
            user_agent: std::env::var("REMCACHE_USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_template_builds_request() {
        let template = RequestTemplate::new(Method::POST)
            .try_with_header("x-tenant", "acme")
            .unwrap()
            .with_body("payload")
            .with_query("v", "2");

        let url = Url::parse("http://origin.test/items/a").unwrap();
        let request = template.build(url);

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().as_str(), "http://origin.test/items/a?v=2");
        assert_eq!(request.headers().get("x-tenant").unwrap(), "acme");
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(&b"payload"[..])
        );
    }

    #[test]
    fn test_template_without_query_leaves_url_alone() {
        let url = Url::parse("http://origin.test/items/a").unwrap();
        let request = RequestTemplate::get().build(url);
        assert_eq!(request.url().as_str(), "http://origin.test/items/a");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_template_rejects_bad_header() {
        let result = RequestTemplate::get().try_with_header("bad header", "x");
        assert!(matches!(result, Err(CacheError::Config { .. })));
    }

    #[test]
    fn test_fetch_info_serializes_millis() {
        let info = FetchInfo::new("http://origin.test/a", 200, Duration::from_millis(1500));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["url"], "http://origin.test/a");
        assert_eq!(json["status"], 200);
        assert_eq!(json["duration_ms"], 1500);
        assert!(json["fetched_at"].is_string());
    }

    #[test]
    fn test_fetch_info_fetched_at_is_attempt_start() {
        let before = Utc::now();
        let info = FetchInfo::new("http://origin.test/a", 200, Duration::from_secs(10));
        let elapsed = chrono::Duration::seconds(10);

        assert!(info.fetched_at <= Utc::now() - elapsed);
        assert!(info.fetched_at >= before - elapsed);

        let start = before - chrono::Duration::seconds(3);
        let explicit = FetchInfo::started_at("http://origin.test/a", 500, Duration::ZERO, start);
        assert_eq!(explicit.fetched_at, start);
        assert!(!explicit.is_ok());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: RemoteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RemoteConfig::default());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT.as_secs());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("REMCACHE_TIMEOUT", "5");
        std::env::set_var("REMCACHE_MAX_CONCURRENCY", "not-a-number");
        std::env::remove_var("REMCACHE_USER_AGENT");

        let config = RemoteConfig::from_env();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrency, 16);
        assert!(config.user_agent.is_none());

        std::env::remove_var("REMCACHE_TIMEOUT");
        std::env::remove_var("REMCACHE_MAX_CONCURRENCY");
    }

    #[test]
    fn test_batch_result_into_result() {
        let result = BatchResult::default();
        assert!(result.is_complete());
        let (bodies, infos) = result.into_result().unwrap();
        assert!(bodies.is_empty());
        assert!(infos.is_empty());
    }
}
