//! Origin client: resolves normalized keys and fetches them.
//!
//! Keys reaching this module are already normalized. Status codes are
//! interpreted in http.rs only.

use std::sync::Arc;

use tracing::debug;

use crate::error::CacheResult;
use crate::options::ResolvedOptions;
use crate::types::{BatchResult, Fetched, RequestTemplate};

mod batch;
mod http;

pub use http::HttpClient;

/// Resolver and HTTP client for one provider. Clones share everything.
#[derive(Debug, Clone)]
pub(crate) struct OriginClient {
    options: Arc<ResolvedOptions>,
}

impl OriginClient {
    pub(crate) fn new(options: ResolvedOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub(crate) fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub(crate) fn resolve(
        &self,
        key: &str,
        template: &RequestTemplate,
    ) -> CacheResult<reqwest::Request> {
        self.options.resolver()?.resolve(key, template)
    }

    /// Resolve and fetch one normalized key.
    pub(crate) async fn fetch(&self, key: &str, template: &RequestTemplate) -> CacheResult<Fetched> {
        let request = self.resolve(key, template)?;
        debug!(key = %key, method = %request.method(), url = %request.url(), "fetching key");
        self.options.http_client().fetch(request).await
    }

    /// Fetch normalized, deduplicated keys concurrently.
    pub(crate) async fn fetch_batch(
        &self,
        keys: Vec<String>,
        template: &RequestTemplate,
    ) -> BatchResult {
        batch::fetch_batch(self, keys, template).await
    }
}
