//! Remote options and their one-time resolution.
//!
//! [`RemoteOptions`] is what callers assemble; every field may be left unset.
//! [`RemoteOptions::resolve`] fills the defaults once and yields an immutable
//! [`ResolvedOptions`], so the fetch path never re-checks them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::HttpClient;
use crate::error::{CacheError, CacheResult};
use crate::resolver::Resolver;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::RemoteConfig;

/// Timeout used when none (or zero) is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Batch concurrency used when none (or zero) is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Configuration of a remote provider.
#[derive(Clone, Default)]
pub struct RemoteOptions {
    /// Transport for outbound requests; reqwest when unset.
    pub transport: Option<Arc<dyn Transport>>,

    /// Per-request timeout; 30 seconds when unset or zero.
    pub timeout: Option<Duration>,

    /// Key resolver. Required, but only checked on first resolution.
    pub resolver: Option<Arc<dyn Resolver>>,

    /// Maximum in-flight requests per batch; 16 when unset or zero.
    pub max_concurrency: Option<usize>,

    /// User-Agent for the default transport.
    pub user_agent: Option<String>,
}

impl fmt::Debug for RemoteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOptions")
            .field("transport", &self.transport)
            .field("timeout", &self.timeout)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .field("max_concurrency", &self.max_concurrency)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RemoteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed options from a serializable config.
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            transport: None,
            timeout: Some(Duration::from_secs(config.timeout_secs)),
            resolver: None,
            max_concurrency: Some(config.max_concurrency),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Seed options from `REMCACHE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_config(&RemoteConfig::from_env())
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_shared_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Fill defaults and build the default transport if needed.
    pub fn resolve(self) -> CacheResult<ResolvedOptions> {
        let timeout = match self.timeout {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_TIMEOUT,
        };

        let max_concurrency = match self.max_concurrency {
            Some(n) if n > 0 => n,
            _ => DEFAULT_MAX_CONCURRENCY,
        };

        let default_transport = self.transport.is_none();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(timeout, self.user_agent.as_deref())?),
        };

        Ok(ResolvedOptions {
            http: HttpClient::new(transport, timeout),
            resolver: self.resolver,
            max_concurrency,
            default_transport,
        })
    }
}

/// Fully resolved, immutable options.
#[derive(Clone)]
pub struct ResolvedOptions {
    http: HttpClient,
    resolver: Option<Arc<dyn Resolver>>,
    max_concurrency: usize,
    default_transport: bool,
}

impl fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("http", &self.http)
            .field("has_resolver", &self.resolver.is_some())
            .field("max_concurrency", &self.max_concurrency)
            .field("default_transport", &self.default_transport)
            .finish()
    }
}

impl ResolvedOptions {
    pub fn timeout(&self) -> Duration {
        self.http.timeout()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Whether the reqwest transport was filled in as the default.
    pub fn is_default_transport(&self) -> bool {
        self.default_transport
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Configured resolver, or a configuration error when there is none.
    pub fn resolver(&self) -> CacheResult<&Arc<dyn Resolver>> {
        self.resolver
            .as_ref()
            .ok_or_else(|| CacheError::config("no resolver configured"))
    }

    /// HTTP client with the configured transport and timeout.
    pub fn http_client(&self) -> HttpClient {
        self.http.clone()
    }
}

impl From<&RemoteConfig> for RemoteOptions {
    fn from(config: &RemoteConfig) -> Self {
        Self::from_config(config)
    }
}
