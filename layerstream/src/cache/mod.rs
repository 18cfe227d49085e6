//! Request cache and deduplicator.
//!
//! Shared across all layers and viewport updates. For any cache key at
//! most one network request is ever in flight; repeated identical requests
//! inside the freshness window return the cached result without a network
//! round trip.
//!
//! The completed-entry store is a `moka` cache (lock-free reads, automatic
//! capacity eviction). In-flight coalescing uses a `dashmap` keyed by
//! request identity: the first caller for a key owns the fetch, later
//! callers subscribe to a broadcast channel and receive the same result.

mod key;
mod store;

pub use key::{RequestKey, RequestKind};
pub use store::{CacheConfig, CacheEntry, CacheStats, RequestCache};
