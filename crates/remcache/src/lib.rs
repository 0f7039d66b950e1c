//! Remote origin fetching for key-value caches.
//!
//! This crate augments a local cache [`Provider`] with the ability to:
//!
//! - Resolve a cache key into a concrete HTTP request ([`Resolver`])
//! - Fetch one key from the origin with per-attempt diagnostics ([`FetchInfo`])
//! - Fetch a batch of keys concurrently, isolating failures per key
//!
//! Caching policy (TTL, eviction, write-through) stays with the provider.
//!
//! # Quick Start
//!
//! ```no_run
//! use remcache::{
//!     BaseUrlResolver, Fetcher, MemoryProvider, RemoteOptions, RemoteProvider, RequestTemplate,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let options = RemoteOptions::from_env()
//!     .with_resolver(BaseUrlResolver::new("https://origin.example.com/v1/")?);
//! let remote = RemoteProvider::new(MemoryProvider::new(), options)?;
//!
//! let fetched = remote.fetch("users/42", &RequestTemplate::get()).await?;
//! println!("{} bytes in {:?}", fetched.body.len(), fetched.info.duration);
//!
//! let keys = vec!["users/1".to_string(), "users/2".to_string()];
//! let batch = remote.fetch_multi(&keys, &RequestTemplate::get()).await;
//! if let Some(err) = &batch.error {
//!     eprintln!("{}", err);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `REMCACHE_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `REMCACHE_MAX_CONCURRENCY` | In-flight requests per batch (default: 16) |
//! | `REMCACHE_USER_AGENT` | User-Agent of the default transport |

pub mod client;
pub mod error;
pub mod options;
pub mod provider;
pub mod remote;
pub mod resolver;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::HttpClient;
pub use error::{BatchError, CacheError, CacheResult, ErrorKind, KeyFailure};
pub use options::{RemoteOptions, ResolvedOptions, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};
pub use provider::{MemoryProvider, Provider};
pub use remote::{Fetcher, RemoteCache, RemoteProvider};
pub use resolver::{BaseUrlResolver, FnResolver, PatternResolver, Resolver, KEY_PLACEHOLDER};
pub use transport::{ReqwestTransport, Transport, DEFAULT_USER_AGENT};
pub use types::{BatchResult, FetchInfo, Fetched, RemoteConfig, RequestTemplate};
