//! Per-layer loading orchestration.
//!
//! A [`LayerLoadManager`] is the single authority for how one layer's data
//! is fetched. Construction classifies the layer from its declared feature
//! count; `resolve` then dispatches to the full-collection, viewport-bounded,
//! or tile-endpoint path and always hands back the same [`LoadResult`]
//! shape. All fetches go through the shared request cache, so identical
//! requests across managers or re-renders coalesce into one network call.
//!
//! # Ordering
//!
//! Every bounded or cluster fetch is tagged with the viewport sequence
//! number active when it was issued. A fetch that completes after a newer
//! sequence has already applied is discarded: the caller gets
//! [`LoadResult::Pending`] and the consumer-visible result
//! ([`LayerLoadManager::latest_result`]) keeps the newer data. Superseded
//! fetches are not aborted at the transport level; ignoring their results
//! is sufficient.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{RequestCache, RequestKey};
use crate::client::{ClusterCollection, FeatureCollection, LayerDataClient, TruncationMeta};
use crate::config::EngineConfig;
use crate::error::LoadError;
use crate::result::LoadResult;
use crate::strategy::{describe, LoadingStrategy, StrategyDescriptor};
use crate::viewport::ViewportSnapshot;

/// Lifecycle of a layer's loading pipeline.
///
/// Classification happens in the constructor, so there is no
/// uninitialized state. Tile strategies resolve immediately; fetching
/// states occur only for full-collection and viewport-bounded layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Strategy computed, nothing fetched yet.
    Classified,
    /// A feature fetch is in flight.
    Fetching,
    /// The latest fetch applied successfully.
    Resolved,
    /// The latest fetch failed.
    Failed,
}

#[derive(Debug)]
struct ManagerInner {
    declared_count: u64,
    strategy: LoadingStrategy,
    phase: LoadPhase,
    /// Highest viewport sequence seen by any resolve call.
    latest_seq: u64,
    /// Consumer-visible feature/tile result.
    last_applied: Option<LoadResult>,
    /// Consumer-visible cluster result.
    last_clusters: Option<LoadResult>,
}

/// Per-layer loading authority.
pub struct LayerLoadManager {
    layer_id: String,
    config: Arc<EngineConfig>,
    client: Arc<dyn LayerDataClient>,
    cache: Arc<RequestCache>,
    inner: Mutex<ManagerInner>,
}

impl LayerLoadManager {
    pub(crate) fn new(
        layer_id: String,
        declared_count: u64,
        config: Arc<EngineConfig>,
        client: Arc<dyn LayerDataClient>,
        cache: Arc<RequestCache>,
    ) -> Self {
        let strategy = config.thresholds.classify(declared_count);
        debug!(layer = %layer_id, count = declared_count, %strategy, "layer classified");
        Self {
            layer_id,
            config,
            client,
            cache,
            inner: Mutex::new(ManagerInner {
                declared_count,
                strategy,
                phase: LoadPhase::Classified,
                latest_seq: 0,
                last_applied: None,
                last_clusters: None,
            }),
        }
    }

    /// The layer this manager loads.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// The declared feature count driving classification.
    pub fn declared_count(&self) -> u64 {
        self.inner.lock().declared_count
    }

    /// The active loading strategy.
    pub fn strategy(&self) -> LoadingStrategy {
        self.inner.lock().strategy
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LoadPhase {
        self.inner.lock().phase
    }

    /// Whether this layer renders from a tile endpoint.
    pub fn wants_tiles(&self) -> bool {
        self.strategy().uses_tiles()
    }

    /// Whether this layer should be clustered at low zoom.
    ///
    /// Independent of the tile decision: clustering is a point-density
    /// hint, tiling is a transport decision.
    pub fn wants_clustering(&self) -> bool {
        self.config
            .thresholds
            .wants_clustering(self.declared_count())
    }

    /// The vector-tile endpoint template, present iff [`Self::wants_tiles`].
    pub fn tile_endpoint(&self) -> Option<String> {
        self.wants_tiles()
            .then(|| self.client.tile_endpoint(&self.layer_id))
    }

    /// User-facing description of the active strategy.
    pub fn describe(&self) -> StrategyDescriptor {
        let inner = self.inner.lock();
        describe(inner.strategy, inner.declared_count)
    }

    /// The consumer-visible result: always the highest applied sequence.
    pub fn latest_result(&self) -> Option<LoadResult> {
        self.inner.lock().last_applied.clone()
    }

    /// The consumer-visible cluster result.
    pub fn latest_clusters(&self) -> Option<LoadResult> {
        self.inner.lock().last_clusters.clone()
    }

    /// Update the layer's declared feature count.
    ///
    /// Reclassifies; on a strategy change the pipeline resets to
    /// `Classified` and previously applied results are dropped.
    pub fn set_declared_count(&self, declared_count: u64) {
        let mut inner = self.inner.lock();
        inner.declared_count = declared_count;
        let strategy = self.config.thresholds.classify(declared_count);
        if strategy != inner.strategy {
            info!(
                layer = %self.layer_id,
                old = %inner.strategy,
                new = %strategy,
                count = declared_count,
                "layer reclassified"
            );
            inner.strategy = strategy;
            inner.phase = LoadPhase::Classified;
            inner.last_applied = None;
            inner.last_clusters = None;
        }
    }

    /// Resolve this layer's data for the given viewport.
    ///
    /// Dispatches on the active strategy; see the module docs for the
    /// uniform result contract. Suspends only on network fetches; tile
    /// strategies return synchronously.
    pub async fn resolve(&self, viewport: Option<&ViewportSnapshot>) -> LoadResult {
        match self.strategy() {
            LoadingStrategy::TileHandoff | LoadingStrategy::TileOnly => {
                let url = self.client.tile_endpoint(&self.layer_id);
                self.apply(None, LoadResult::TileDescriptor(url))
            }
            LoadingStrategy::FullCollection => self.resolve_full().await,
            LoadingStrategy::ViewportBounded => match viewport {
                Some(viewport) => self.resolve_bounded(viewport).await,
                None => self.apply(None, LoadResult::Failed(LoadError::MissingViewport)),
            },
        }
    }

    async fn resolve_full(&self) -> LoadResult {
        self.inner.lock().phase = LoadPhase::Fetching;

        let key = RequestKey::full_collection(&self.layer_id);
        let client = Arc::clone(&self.client);
        let layer_id = self.layer_id.clone();
        let result = self
            .cache
            .get_or_fetch(key, move || async move {
                match client.fetch_full_collection(&layer_id).await {
                    Ok(collection) => LoadResult::Features {
                        collection: Arc::new(collection),
                        truncation: None,
                    },
                    Err(e) => LoadResult::Failed(LoadError::Network(e.to_string())),
                }
            })
            .await;

        self.apply(None, result)
    }

    async fn resolve_bounded(&self, viewport: &ViewportSnapshot) -> LoadResult {
        let issued = viewport.seq;
        {
            let mut inner = self.inner.lock();
            if issued < inner.latest_seq {
                // Superseded before we even started.
                return LoadResult::Pending;
            }
            inner.latest_seq = issued;
            inner.phase = LoadPhase::Fetching;
        }

        let boxes = match viewport.bounds.normalized() {
            Ok(normalized) => normalized.boxes(),
            Err(e) => return self.apply(Some(issued), LoadResult::Failed(e.into())),
        };

        let max_features = self.config.max_features;
        let simplify = self.config.simplify_default;
        let fetches = boxes.into_iter().map(|bounds| {
            let key = RequestKey::bounded(&self.layer_id, &bounds, max_features, simplify);
            let client = Arc::clone(&self.client);
            let layer_id = self.layer_id.clone();
            self.cache.get_or_fetch(key, move || async move {
                match client
                    .fetch_bounded_features(&layer_id, bounds, max_features, simplify)
                    .await
                {
                    Ok(bounded) => LoadResult::Features {
                        collection: Arc::new(bounded.collection),
                        truncation: Some(bounded.meta),
                    },
                    Err(e) => LoadResult::Failed(LoadError::Network(e.to_string())),
                }
            })
        });

        let results = join_all(fetches).await;
        self.apply(Some(issued), merge_feature_results(results))
    }

    /// Resolve cluster markers for the given viewport.
    ///
    /// Clusters live beside the feature pipeline: they share viewport
    /// sequencing but apply to their own consumer-visible slot.
    pub async fn resolve_clusters(&self, viewport: Option<&ViewportSnapshot>) -> LoadResult {
        let viewport = match viewport {
            Some(viewport) => viewport,
            None => return LoadResult::Failed(LoadError::MissingViewport),
        };

        let issued = viewport.seq;
        {
            let mut inner = self.inner.lock();
            if issued < inner.latest_seq {
                return LoadResult::Pending;
            }
            inner.latest_seq = issued;
        }

        let boxes = match viewport.bounds.normalized() {
            Ok(normalized) => normalized.boxes(),
            Err(e) => return self.apply_clusters(issued, LoadResult::Failed(e.into())),
        };

        let strategy = self.strategy();
        let zoom = viewport.zoom;
        let fetches = boxes.into_iter().map(|bounds| {
            let key = RequestKey::clusters(&self.layer_id, strategy, &bounds, zoom);
            let client = Arc::clone(&self.client);
            let layer_id = self.layer_id.clone();
            self.cache.get_or_fetch(key, move || async move {
                match client.fetch_clusters(&layer_id, bounds, zoom).await {
                    Ok(clusters) => LoadResult::Clusters(Arc::new(clusters)),
                    Err(e) => LoadResult::Failed(LoadError::Network(e.to_string())),
                }
            })
        });

        let results = join_all(fetches).await;
        self.apply_clusters(issued, merge_cluster_results(results))
    }

    /// Apply a completed feature/tile result, discarding stale sequences.
    fn apply(&self, issued: Option<u64>, result: LoadResult) -> LoadResult {
        let mut inner = self.inner.lock();
        if let Some(issued) = issued {
            if issued < inner.latest_seq {
                debug!(
                    layer = %self.layer_id,
                    issued,
                    latest = inner.latest_seq,
                    "discarding stale result"
                );
                return LoadResult::Pending;
            }
        }
        inner.phase = if result.is_failed() {
            LoadPhase::Failed
        } else {
            LoadPhase::Resolved
        };
        inner.last_applied = Some(result.clone());
        result
    }

    /// Apply a completed cluster result, discarding stale sequences.
    fn apply_clusters(&self, issued: u64, result: LoadResult) -> LoadResult {
        let mut inner = self.inner.lock();
        if issued < inner.latest_seq {
            debug!(
                layer = %self.layer_id,
                issued,
                latest = inner.latest_seq,
                "discarding stale cluster result"
            );
            return LoadResult::Pending;
        }
        inner.last_clusters = Some(result.clone());
        result
    }
}

/// Merge per-box feature results into one.
///
/// A single box passes through untouched. For a split viewport the
/// collections concatenate and the truncation metadata sums; any failed
/// box fails the whole resolve.
fn merge_feature_results(results: Vec<LoadResult>) -> LoadResult {
    if results.len() == 1 {
        return results.into_iter().next().unwrap_or(LoadResult::Pending);
    }

    let mut features = Vec::new();
    let mut meta: Option<TruncationMeta> = None;
    for result in results {
        match result {
            LoadResult::Features {
                collection,
                truncation,
            } => {
                features.extend(collection.features.iter().cloned());
                if let Some(t) = truncation {
                    let merged = meta.get_or_insert(TruncationMeta::default());
                    merged.total_in_bounds += t.total_in_bounds;
                    merged.returned += t.returned;
                    merged.limited |= t.limited;
                }
            }
            LoadResult::Failed(e) => return LoadResult::Failed(e),
            other => return other,
        }
    }

    LoadResult::Features {
        collection: Arc::new(FeatureCollection { features }),
        truncation: meta,
    }
}

/// Merge per-box cluster results into one.
fn merge_cluster_results(results: Vec<LoadResult>) -> LoadResult {
    if results.len() == 1 {
        return results.into_iter().next().unwrap_or(LoadResult::Pending);
    }

    let mut clusters = Vec::new();
    for result in results {
        match result {
            LoadResult::Clusters(collection) => {
                clusters.extend(collection.clusters.iter().cloned());
            }
            LoadResult::Failed(e) => return LoadResult::Failed(e),
            other => return other,
        }
    }

    LoadResult::Clusters(Arc::new(ClusterCollection { clusters }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::CacheConfig;
    use crate::client::{Cluster, MockLayerDataClient};
    use crate::geo::SpatialBounds;

    fn manager_with(
        client: Arc<MockLayerDataClient>,
        declared_count: u64,
    ) -> (LayerLoadManager, Arc<RequestCache>) {
        let config = Arc::new(EngineConfig::default());
        let cache = Arc::new(RequestCache::new(CacheConfig::default()));
        let manager = LayerLoadManager::new(
            "parcels".to_string(),
            declared_count,
            config,
            client,
            Arc::clone(&cache),
        );
        (manager, cache)
    }

    fn snapshot(seq: u64, west: f64) -> ViewportSnapshot {
        ViewportSnapshot {
            bounds: SpatialBounds::new(west, 50.0, west + 1.0, 51.0),
            zoom: 12,
            seq,
        }
    }

    #[test]
    fn test_construction_classifies() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(client, 500);
        assert_eq!(manager.strategy(), LoadingStrategy::FullCollection);
        assert_eq!(manager.phase(), LoadPhase::Classified);
        assert!(!manager.wants_tiles());
        assert!(!manager.wants_clustering());
        assert_eq!(manager.tile_endpoint(), None);
    }

    #[test]
    fn test_tile_layer_flags() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(client, 150_000);
        assert_eq!(manager.strategy(), LoadingStrategy::TileOnly);
        assert!(manager.wants_tiles());
        // Clustering is orthogonal to tiling.
        assert!(manager.wants_clustering());
        assert!(manager.tile_endpoint().unwrap().contains("parcels"));
    }

    #[tokio::test]
    async fn test_tile_strategy_resolves_without_network() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 150_000);

        let result = manager.resolve(None).await;
        match result {
            LoadResult::TileDescriptor(url) => assert!(url.contains("parcels")),
            other => panic!("expected tile descriptor, got {other:?}"),
        }
        assert_eq!(manager.phase(), LoadPhase::Resolved);
        assert_eq!(client.full_calls(), 0);
        assert_eq!(client.bounded_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_collection_fetches_once_then_caches() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 500);

        let first = manager.resolve(None).await;
        assert!(matches!(first, LoadResult::Features { .. }));
        assert_eq!(manager.phase(), LoadPhase::Resolved);

        let second = manager.resolve(None).await;
        assert_eq!(first, second);
        assert_eq!(client.full_calls(), 1);
    }

    #[tokio::test]
    async fn test_bounded_requires_viewport() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        let result = manager.resolve(None).await;
        assert_eq!(result, LoadResult::Failed(LoadError::MissingViewport));
        assert_eq!(manager.phase(), LoadPhase::Failed);
        assert_eq!(client.bounded_calls(), 0);
    }

    #[tokio::test]
    async fn test_bounded_fetches_viewport() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        let result = manager.resolve(Some(&snapshot(1, 9.0))).await;
        assert!(matches!(result, LoadResult::Features { .. }));
        assert_eq!(client.bounded_calls(), 1);
        assert_eq!(manager.phase(), LoadPhase::Resolved);
        assert_eq!(manager.latest_result(), Some(result));
    }

    #[tokio::test]
    async fn test_bounded_rejects_malformed_viewport() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        let viewport = ViewportSnapshot {
            bounds: SpatialBounds::new(9.0, 60.0, 10.0, 50.0),
            zoom: 12,
            seq: 1,
        };
        let result = manager.resolve(Some(&viewport)).await;
        assert!(matches!(
            result,
            LoadResult::Failed(LoadError::Bounds(_))
        ));
        assert_eq!(client.bounded_calls(), 0);
    }

    #[tokio::test]
    async fn test_antimeridian_viewport_splits_into_two_fetches() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        let viewport = ViewportSnapshot {
            bounds: SpatialBounds::new(170.0, -10.0, -170.0, 10.0),
            zoom: 4,
            seq: 1,
        };
        let result = manager.resolve(Some(&viewport)).await;
        assert!(matches!(result, LoadResult::Features { .. }));
        assert_eq!(client.bounded_calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_result_is_suppressed() {
        let client = Arc::new(MockLayerDataClient::default());
        client
            .bounded_delays
            .lock()
            .extend([Duration::from_millis(80), Duration::from_millis(5)]);
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        // Distinct bounds so the two resolves are distinct cache keys.
        let old_viewport = snapshot(1, 9.0);
        let new_viewport = snapshot(2, 11.0);

        let (old_result, new_result) = tokio::join!(
            manager.resolve(Some(&old_viewport)),
            manager.resolve(Some(&new_viewport)),
        );

        // The slow sequence-1 fetch finished after sequence 2 had applied.
        assert_eq!(old_result, LoadResult::Pending);
        assert!(matches!(new_result, LoadResult::Features { .. }));
        assert_eq!(manager.latest_result(), Some(new_result));
        assert_eq!(client.bounded_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolve_clusters() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        assert_eq!(
            manager.resolve_clusters(None).await,
            LoadResult::Failed(LoadError::MissingViewport)
        );

        let result = manager.resolve_clusters(Some(&snapshot(1, 9.0))).await;
        assert!(matches!(result, LoadResult::Clusters(_)));
        assert_eq!(client.cluster_calls(), 1);
        assert_eq!(manager.latest_clusters(), Some(result));
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_as_failed() {
        let client = Arc::new(MockLayerDataClient::failing_bounded(
            crate::client::ClientError::Http("connection reset".into()),
        ));
        let (manager, _) = manager_with(Arc::clone(&client), 12_000);

        let result = manager.resolve(Some(&snapshot(1, 9.0))).await;
        assert!(matches!(result, LoadResult::Failed(LoadError::Network(_))));
        assert_eq!(manager.phase(), LoadPhase::Failed);
    }

    #[test]
    fn test_set_declared_count_reclassifies() {
        let client = Arc::new(MockLayerDataClient::default());
        let (manager, _) = manager_with(client, 500);
        assert_eq!(manager.strategy(), LoadingStrategy::FullCollection);

        manager.set_declared_count(150_000);
        assert_eq!(manager.strategy(), LoadingStrategy::TileOnly);
        assert_eq!(manager.phase(), LoadPhase::Classified);
        assert_eq!(manager.latest_result(), None);

        // Same band: no reset.
        manager.set_declared_count(200_000);
        assert_eq!(manager.strategy(), LoadingStrategy::TileOnly);
    }

    #[test]
    fn test_merge_feature_results_sums_truncation() {
        let half = |returned, limited| LoadResult::Features {
            collection: Arc::new(FeatureCollection::default()),
            truncation: Some(TruncationMeta {
                total_in_bounds: returned * 10,
                returned,
                limited,
            }),
        };
        let merged = merge_feature_results(vec![half(100, false), half(200, true)]);
        match merged {
            LoadResult::Features { truncation, .. } => {
                let meta = truncation.unwrap();
                assert_eq!(meta.returned, 300);
                assert_eq!(meta.total_in_bounds, 3_000);
                assert!(meta.limited);
            }
            other => panic!("expected features, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_cluster_results_concatenates() {
        let markers = |count| {
            LoadResult::Clusters(Arc::new(ClusterCollection {
                clusters: vec![Cluster {
                    lon: 0.0,
                    lat: 0.0,
                    count,
                }],
            }))
        };
        let merged = merge_cluster_results(vec![markers(10), markers(20)]);
        match merged {
            LoadResult::Clusters(collection) => assert_eq!(collection.clusters.len(), 2),
            other => panic!("expected clusters, got {other:?}"),
        }
    }
}
