//! Completed-entry store and in-flight request coalescing.
//!
//! Freshness windows vary per entry kind (full collections live until
//! invalidation, bounded features and clusters expire, failures are
//! negative-cached briefly), so freshness is checked at read time from the
//! entry's own TTL; moka provides the bounded store and capacity eviction
//! underneath.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use moka::future::Cache as MokaCache;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::result::LoadResult;
use crate::strategy::LoadingStrategy;

use super::key::{RequestKey, RequestKind};

/// Default freshness window for bounded feature responses.
pub const DEFAULT_FEATURE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default freshness window for cluster responses.
pub const DEFAULT_CLUSTER_TTL: Duration = Duration::from_secs(2 * 60);

/// Default negative-cache window for failed fetches.
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(30);

/// Default maximum number of retained entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 4_096;

/// Freshness windows and capacity for the request cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long bounded feature responses stay fresh. Default: 5 minutes.
    pub feature_ttl: Duration,
    /// How long cluster responses stay fresh. Default: 2 minutes.
    pub cluster_ttl: Duration,
    /// How long failed fetches are negative-cached. Default: 30 seconds.
    pub negative_ttl: Duration,
    /// Maximum retained entries before LRU eviction. Default: 4096.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            feature_ttl: DEFAULT_FEATURE_TTL,
            cluster_ttl: DEFAULT_CLUSTER_TTL,
            negative_ttl: DEFAULT_NEGATIVE_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// A completed fetch retained by the cache.
///
/// Entries are owned exclusively by the cache; callers receive clones
/// whose collections are reference-counted.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The fetch outcome.
    pub result: LoadResult,
    /// When the entry was populated.
    pub inserted_at: Instant,
    /// Freshness window; `None` means fresh until explicit invalidation.
    pub ttl: Option<Duration>,
}

impl CacheEntry {
    fn new(result: LoadResult, ttl: Option<Duration>) -> Self {
        Self {
            result,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// When this entry expires, if it does.
    pub fn expires_at(&self) -> Option<Instant> {
        self.ttl.map(|ttl| self.inserted_at + ttl)
    }

    /// Whether the entry is still fresh at `now`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at() {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

/// Counters describing cache behavior since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh entries served without any network activity.
    pub hits: u64,
    /// Requests that triggered an underlying fetch.
    pub misses: u64,
    /// Requests that joined an already in-flight fetch.
    pub coalesced: u64,
    /// Fetches that completed with a failure.
    pub failures: u64,
    /// Layer invalidations performed.
    pub invalidations: u64,
}

/// Removes the in-flight slot if the owning fetch is dropped mid-flight,
/// so waiters fail over to a retry instead of waiting forever.
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<RequestKey, broadcast::Sender<LoadResult>>,
    key: &'a RequestKey,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.in_flight.remove(self.key);
        }
    }
}

/// Shared request cache with single-flight deduplication.
pub struct RequestCache {
    entries: MokaCache<RequestKey, CacheEntry>,
    in_flight: DashMap<RequestKey, broadcast::Sender<LoadResult>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
    invalidations: AtomicU64,
}

impl RequestCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_entries)
            .support_invalidation_closures()
            .build();
        Self {
            entries,
            in_flight: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Look up a fresh entry without triggering a fetch.
    pub async fn get(&self, key: &RequestKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key).await?;
        entry.is_fresh(Instant::now()).then_some(entry)
    }

    /// Resolve a request through the cache.
    ///
    /// A fresh entry is returned as-is. If a fetch for the same key is
    /// already in flight, this call attaches as a waiter and receives that
    /// fetch's result. Otherwise `fetch` runs here, populates the entry,
    /// and releases all waiters with the same result. At most one `fetch`
    /// runs per key at any time.
    pub async fn get_or_fetch<F, Fut>(&self, key: RequestKey, fetch: F) -> LoadResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LoadResult>,
    {
        loop {
            if let Some(entry) = self.entries.get(&key).await {
                if entry.is_fresh(Instant::now()) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return entry.result;
                }
                // Expired: treated as absent; whoever wins the in-flight
                // slot below refetches.
            }

            let subscribed = match self.in_flight.entry(key.clone()) {
                Entry::Occupied(occupied) => Some(occupied.get().subscribe()),
                Entry::Vacant(vacant) => {
                    let (tx, _rx) = broadcast::channel(1);
                    vacant.insert(tx);
                    None
                }
            };

            match subscribed {
                Some(mut rx) => {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    match rx.recv().await {
                        Ok(result) => return result,
                        // The owner completed before we subscribed, or its
                        // future was dropped mid-flight. Re-check the cache.
                        Err(_) => continue,
                    }
                }
                None => break,
            }
        }

        // This call owns the fetch for `key`.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let mut guard = InFlightGuard {
            in_flight: &self.in_flight,
            key: &key,
            armed: true,
        };

        let result = fetch().await;
        if result.is_failed() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let ttl = self.ttl_for(&key, &result);
        self.entries
            .insert(key.clone(), CacheEntry::new(result.clone(), ttl))
            .await;

        // Release waiters only after the entry is visible, so a subscriber
        // that misses the send finds the entry on its retry.
        if let Some((_, tx)) = self.in_flight.remove(&key) {
            let _ = tx.send(result.clone());
        }
        guard.armed = false;

        debug!(
            layer = %key.layer_id,
            kind = ?key.kind,
            failed = result.is_failed(),
            "request fetch completed"
        );
        result
    }

    /// Remove every entry belonging to a layer.
    ///
    /// Used when the layer's underlying data is known to have changed,
    /// e.g. after an upload. Fetches already in flight are not interrupted;
    /// the next viewport settle refetches through the empty cache.
    pub fn invalidate_layer(&self, layer_id: &str) {
        let layer = layer_id.to_string();
        if let Err(e) = self
            .entries
            .invalidate_entries_if(move |key, _| key.layer_id == layer)
        {
            warn!(error = %e, layer = layer_id, "cache invalidation predicate rejected");
            return;
        }
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(layer = layer_id, "layer cache invalidated");
    }

    /// Run pending maintenance (eviction, invalidation) immediately.
    ///
    /// Moka applies these lazily; tests call this before asserting on
    /// post-invalidation state.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Current number of retained entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    fn ttl_for(&self, key: &RequestKey, result: &LoadResult) -> Option<Duration> {
        if result.is_failed() {
            return Some(self.config.negative_ttl);
        }
        match key.kind {
            RequestKind::Clusters => Some(self.config.cluster_ttl),
            RequestKind::Features => match key.strategy {
                // Layer content is immutable within a session; full
                // collections live until explicit invalidation.
                LoadingStrategy::FullCollection => None,
                _ => Some(self.config.feature_ttl),
            },
        }
    }
}
