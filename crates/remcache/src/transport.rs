//! Pluggable request transport.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::{CacheError, CacheResult};

/// Default User-Agent sent by [`ReqwestTransport`].
pub const DEFAULT_USER_AGENT: &str = concat!("remcache/", env!("CARGO_PKG_VERSION"));

/// Sends a request and returns the raw response, whatever its status.
///
/// Implementations are shared by every fetch of a batch and must tolerate
/// concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: reqwest::Request) -> CacheResult<reqwest::Response>;
}

/// Transport backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> CacheResult<Self> {
        let user_agent = user_agent.unwrap_or(DEFAULT_USER_AGENT);
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| CacheError::config(format!("invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| CacheError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: reqwest::Request) -> CacheResult<reqwest::Response> {
        let url = request.url().to_string();
        self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                CacheError::Timeout {
                    url,
                    timeout: self.timeout,
                }
            } else {
                CacheError::from(e)
            }
        })
    }
}
