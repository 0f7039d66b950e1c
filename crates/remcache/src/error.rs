//! Error types for remote fetching.

use std::fmt;
use std::time::Duration;

use crate::types::FetchInfo;

/// Remote cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Key could not be turned into a request. No I/O happened.
    #[error("cannot resolve key {key:?}: {reason}")]
    Resolve { key: String, reason: String },

    /// Missing or invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Network-level failure (DNS, connect, TLS, protocol).
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The request did not complete within the client timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The origin answered with something other than 200.
    #[error("invalid http status: {} from {}", .info.status, .info.url)]
    Status { info: FetchInfo },

    /// Status was 200 but the body could not be drained.
    #[error("failed to read response body from {}: {message}", .info.url)]
    BodyRead { info: FetchInfo, message: String },

    /// Local store failure.
    #[error("provider error: {message}")]
    Provider { message: String },

    /// A batch task panicked or was cancelled.
    #[error("fetch task failed: {message}")]
    Task { message: String },
}

/// Coarse classification of a [`CacheError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Resolution,
    Config,
    Transport,
    Status,
    BodyRead,
    Provider,
    Task,
}

impl CacheError {
    pub fn resolve(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Resolve {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve { .. } => ErrorKind::Resolution,
            Self::Config { .. } => ErrorKind::Config,
            Self::Transport { .. } | Self::Timeout { .. } => ErrorKind::Transport,
            Self::Status { .. } => ErrorKind::Status,
            Self::BodyRead { .. } => ErrorKind::BodyRead,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Task { .. } => ErrorKind::Task,
        }
    }

    /// Diagnostics of the attempt, present only when a response came back.
    pub fn info(&self) -> Option<&FetchInfo> {
        match self {
            Self::Status { info } | Self::BodyRead { info, .. } => Some(info),
            _ => None,
        }
    }

    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        self.info().map(|info| info.status)
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        Self::Transport {
            url,
            message: err.to_string(),
        }
    }
}

/// Result type for remote cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// One failing key of a batch fetch.
#[derive(Debug, thiserror::Error)]
#[error("{key}: {error}")]
pub struct KeyFailure {
    pub key: String,
    pub error: CacheError,
}

/// Aggregate error of a batch fetch: one labeled cause per failing key.
///
/// Never empty. A batch where every key succeeded carries no `BatchError`
/// at all.
#[derive(Debug, thiserror::Error)]
#[error("{}", render_failures(.failures))]
pub struct BatchError {
    failures: Vec<KeyFailure>,
}

impl BatchError {
    /// Build from collected failures; `None` when there are none.
    pub fn from_failures(mut failures: Vec<KeyFailure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by(|a, b| a.key.cmp(&b.key));
        Some(Self { failures })
    }

    pub fn failures(&self) -> &[KeyFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<KeyFailure> {
        self.failures
    }

    /// Failing keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&CacheError> {
        self.failures
            .iter()
            .find(|f| f.key == key)
            .map(|f| &f.error)
    }

    pub fn by_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &KeyFailure> {
        self.failures.iter().filter(move |f| f.error.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

fn render_failures(failures: &[KeyFailure]) -> String {
    let noun = if failures.len() == 1 { "key" } else { "keys" };
    let mut out = format!("{} {} failed to fetch:", failures.len(), noun);
    for failure in failures {
        out.push_str("\n\t* ");
        out.push_str(&failure.to_string());
    }
    out
}
