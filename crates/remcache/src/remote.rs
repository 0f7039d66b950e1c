//! Remote provider: a [`Provider`] that can also resolve and fetch keys from
//! an origin.

use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::client::OriginClient;
use crate::error::CacheResult;
use crate::options::{RemoteOptions, ResolvedOptions};
use crate::provider::Provider;
use crate::resolver::Resolver;
use crate::types::{BatchResult, Fetched, RequestTemplate};

/// Fetches cache values from a remote origin.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one key. Errors that happen after a response arrived carry its
    /// [`FetchInfo`](crate::FetchInfo).
    async fn fetch(&self, key: &str, template: &RequestTemplate) -> CacheResult<Fetched>;

    /// Fetch many keys concurrently. Failures are isolated per key and
    /// reported together in [`BatchResult::error`].
    async fn fetch_multi(&self, keys: &[String], template: &RequestTemplate) -> BatchResult;
}

/// Everything a remote-backed cache offers: local storage, key resolution
/// and origin fetching.
pub trait RemoteCache: Provider + Resolver + Fetcher {}

impl<T: Provider + Resolver + Fetcher + ?Sized> RemoteCache for T {}

/// A [`Provider`] augmented with origin fetching.
///
/// Storage calls go straight to the wrapped provider. Every key is normalized
/// by that provider exactly once before it reaches the resolver.
#[derive(Debug, Clone)]
pub struct RemoteProvider<P> {
    provider: P,
    origin: OriginClient,
}

impl<P: Provider> RemoteProvider<P> {
    /// Resolve `options` and wrap `provider`.
    ///
    /// A missing resolver is not an error here; it surfaces on the first
    /// resolution.
    pub fn new(provider: P, options: RemoteOptions) -> CacheResult<Self> {
        Ok(Self::with_resolved(provider, options.resolve()?))
    }

    pub fn with_resolved(provider: P, options: ResolvedOptions) -> Self {
        Self {
            provider,
            origin: OriginClient::new(options),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &ResolvedOptions {
        self.origin.options()
    }

    pub fn into_inner(self) -> P {
        self.provider
    }
}

#[async_trait]
impl<P: Provider> Provider for RemoteProvider<P> {
    fn normalize(&self, key: &str) -> String {
        self.provider.normalize(key)
    }

    fn normalize_multi(&self, keys: &[String]) -> Vec<String> {
        self.provider.normalize_multi(keys)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        self.provider.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> CacheResult<()> {
        self.provider.set(key, value).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.provider.delete(key).await
    }
}

impl<P: Provider> Resolver for RemoteProvider<P> {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        self.origin.resolve(&self.provider.normalize(key), template)
    }
}

#[async_trait]
impl<P: Provider> Fetcher for RemoteProvider<P> {
    async fn fetch(&self, key: &str, template: &RequestTemplate) -> CacheResult<Fetched> {
        let key = self.provider.normalize(key);
        self.origin.fetch(&key, template).await
    }

    async fn fetch_multi(&self, keys: &[String], template: &RequestTemplate) -> BatchResult {
        let normalized = self.provider.normalize_multi(keys);

        let mut seen = HashSet::with_capacity(normalized.len());
        let unique: Vec<String> = normalized
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();
        if unique.len() < keys.len() {
            debug!(
                requested = keys.len(),
                unique = unique.len(),
                "collapsed duplicate keys"
            );
        }

        self.origin.fetch_batch(unique, template).await
    }
}
