//! Response cache with explicit invalidation.
//!
//! Entries are serialized responses keyed by [`CacheKey`]. There is no
//! expiry: entries live until a mutation flushes the cache or a reload
//! request removes a single key.
//!
//! # Example
//!
//! ```ignore
//! let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
//! let read = cache
//!     .get_or_compute(&CacheKey::overview(), || store.overview(&limits))
//!     .await?;
//! ```

pub mod key;
pub mod memory_backend;
pub mod read_through;
pub mod traits;

pub use key::CacheKey;
pub use memory_backend::InMemoryCacheBackend;
pub use read_through::{CacheConfig, CacheOutcome, CacheRead, ReadThroughCache};
pub use traits::{CacheBackend, CacheEntry, CacheStats};
