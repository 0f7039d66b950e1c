//! Local cache boundary.
//!
//! The remote layer only needs key normalization from a [`Provider`]; the
//! storage operations are passed through untouched so a remote provider can
//! stand in wherever a plain one is expected.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::CacheResult;

/// Local key-value cache.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Canonical form of `key`. Must be idempotent.
    fn normalize(&self, key: &str) -> String;

    /// Canonical forms of `keys`, in input order.
    fn normalize_multi(&self, keys: &[String]) -> Vec<String> {
        keys.iter().map(|k| self.normalize(k)).collect()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    async fn set(&self, key: &str, value: Bytes) -> CacheResult<()>;

    /// Remove `key`; returns whether it was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn normalize(&self, key: &str) -> String {
        (**self).normalize(key)
    }

    fn normalize_multi(&self, keys: &[String]) -> Vec<String> {
        (**self).normalize_multi(keys)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> CacheResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        (**self).delete(key).await
    }
}

/// In-process provider backed by a map.
///
/// Keys are normalized by trimming surrounding whitespace and lowercasing.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    entries: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn normalize(&self, key: &str) -> String {
        key.trim().to_lowercase()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let key = self.normalize(key);
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> CacheResult<()> {
        let key = self.normalize(key);
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let key = self.normalize(key);
        Ok(self.entries.write().await.remove(&key).is_some())
    }
}
