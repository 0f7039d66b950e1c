//! HTTP layer: send, status check, body drain, FetchInfo.
//!
//! This is the ONLY place for status code handling. Resolution and batching
//! never look at responses.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::transport::Transport;
use crate::types::{FetchInfo, Fetched};

/// Transport plus timeout. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.transport)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and return the body of a 200 response.
    ///
    /// Sending and draining the body share one deadline of `timeout`.
    pub async fn fetch(&self, request: reqwest::Request) -> CacheResult<Fetched> {
        let url = request.url().to_string();
        let fetched_at = Utc::now();
        let started = Instant::now();
        let deadline = started + self.timeout;

        let response = match tokio::time::timeout_at(deadline, self.transport.send(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(CacheError::Timeout {
                    url,
                    timeout: self.timeout,
                })
            }
        };

        let status = response.status();
        let mut info =
            FetchInfo::started_at(url.clone(), status.as_u16(), started.elapsed(), fetched_at);

        if status != StatusCode::OK {
            debug!(url = %url, status = info.status, "origin returned non-200 status");
            return Err(CacheError::Status { info });
        }

        let body = tokio::time::timeout_at(deadline, response.bytes()).await;
        info.duration = started.elapsed();

        match body {
            Ok(Ok(body)) => {
                debug!(
                    url = %url,
                    bytes = body.len(),
                    duration_ms = info.duration.as_millis() as u64,
                    "fetched from origin"
                );
                Ok(Fetched { body, info })
            }
            Ok(Err(e)) => Err(CacheError::BodyRead {
                info,
                message: e.to_string(),
            }),
            Err(_) => Err(CacheError::BodyRead {
                info,
                message: format!("timed out after {:?}", self.timeout),
            }),
        }
    }
}
