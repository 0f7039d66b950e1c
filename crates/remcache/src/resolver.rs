//! Key resolution.
//!
//! A [`Resolver`] turns an already normalized cache key into the concrete
//! request that fetches its value from the origin. Resolution is pure: it
//! never performs I/O, and a failure is final for that key.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{CacheError, CacheResult};
use crate::types::RequestTemplate;

/// Placeholder replaced by the key in a [`PatternResolver`] pattern.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Maps a normalized cache key to an outbound request.
pub trait Resolver: Send + Sync {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        (**self).resolve(key, template)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        (**self).resolve(key, template)
    }
}

/// Appends the key's path segments to a base URL.
///
/// `users/42` against `https://origin/v1/` resolves to
/// `https://origin/v1/users/42`. Each segment is percent-encoded, so keys can
/// never escape the base path.
#[derive(Debug, Clone)]
pub struct BaseUrlResolver {
    base: Url,
}

impl BaseUrlResolver {
    pub fn new(base: &str) -> CacheResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| CacheError::config(format!("invalid base url {:?}: {}", base, e)))?;
        Self::from_url(base)
    }

    pub fn from_url(base: Url) -> CacheResult<Self> {
        if base.cannot_be_a_base() {
            return Err(CacheError::config(format!(
                "base url cannot carry a path: {}",
                base
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, key: &str) -> CacheResult<Url> {
        if key.is_empty() {
            return Err(CacheError::resolve(key, "empty key"));
        }

        let segments: Vec<&str> = key.split('/').collect();
        for segment in &segments {
            match *segment {
                "" => return Err(CacheError::resolve(key, "empty path segment")),
                "." | ".." => {
                    return Err(CacheError::resolve(key, "relative path segment"));
                }
                _ => {}
            }
        }

        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| CacheError::resolve(key, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Resolver for BaseUrlResolver {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        let url = self.url_for(key)?;
        Ok(template.build(url))
    }
}

/// Substitutes the key into a URL pattern such as
/// `https://origin/items/{key}?fmt=raw`.
#[derive(Debug, Clone)]
pub struct PatternResolver {
    pattern: String,
}

impl PatternResolver {
    pub fn new(pattern: impl Into<String>) -> CacheResult<Self> {
        let pattern = pattern.into();
        if !pattern.contains(KEY_PLACEHOLDER) {
            return Err(CacheError::config(format!(
                "url pattern {:?} has no {} placeholder",
                pattern, KEY_PLACEHOLDER
            )));
        }
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Resolver for PatternResolver {
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        if key.is_empty() {
            return Err(CacheError::resolve(key, "empty key"));
        }
        let raw = self.pattern.replace(KEY_PLACEHOLDER, key);
        let url = Url::parse(&raw).map_err(|e| CacheError::resolve(key, e))?;
        Ok(template.build(url))
    }
}

/// Adapts a closure into a [`Resolver`].
pub struct FnResolver<F> {
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str, &RequestTemplate) -> CacheResult<reqwest::Request> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

impl<F> Resolver for FnResolver<F>
where
    F: Fn(&str, &RequestTemplate) -> CacheResult<reqwest::Request> + Send + Sync,
{
    fn resolve(&self, key: &str, template: &RequestTemplate) -> CacheResult<reqwest::Request> {
        (self.f)(key, template)
    }
}
