//! Engine facade.
//!
//! [`LayerLoadEngine`] owns the validated configuration, the shared
//! request cache, and the data-access client, and hands out per-layer
//! managers wired to all three. The host application keeps one engine per
//! map surface and one manager per visible layer.
//!
//! # Example
//!
//! ```ignore
//! use layerstream::{EngineConfig, HttpLayerDataClient, LayerLoadEngine};
//! use std::sync::Arc;
//!
//! let client = Arc::new(HttpLayerDataClient::new("https://gis.example.com/api")?);
//! let engine = LayerLoadEngine::new(EngineConfig::default(), client)?;
//!
//! let parcels = engine.layer("parcels", 12_000);
//! let result = parcels.resolve(Some(&viewport)).await;
//! ```

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheStats, RequestCache};
use crate::client::LayerDataClient;
use crate::config::{ConfigError, EngineConfig};
use crate::error::{validate_feature_count, LoadError};
use crate::manager::LayerLoadManager;

/// Shared entry point for adaptive layer loading.
pub struct LayerLoadEngine {
    config: Arc<EngineConfig>,
    client: Arc<dyn LayerDataClient>,
    cache: Arc<RequestCache>,
}

impl LayerLoadEngine {
    /// Create an engine with a validated configuration.
    pub fn new(
        config: EngineConfig,
        client: Arc<dyn LayerDataClient>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            full_max = config.thresholds.full_collection_max,
            bounded_max = config.thresholds.viewport_bounded_max,
            tile_max = config.thresholds.tile_handoff_max,
            max_features = config.max_features,
            "layer load engine initialized"
        );
        let cache = Arc::new(RequestCache::new(config.cache.clone()));
        Ok(Self {
            config: Arc::new(config),
            client,
            cache,
        })
    }

    /// Create a manager for a layer with a declared feature count.
    pub fn layer(&self, layer_id: impl Into<String>, declared_count: u64) -> LayerLoadManager {
        LayerLoadManager::new(
            layer_id.into(),
            declared_count,
            Arc::clone(&self.config),
            Arc::clone(&self.client),
            Arc::clone(&self.cache),
        )
    }

    /// Create a manager from a raw feature count as reported by external
    /// layer metadata.
    ///
    /// Negative counts are a contract violation and are rejected here,
    /// before classification.
    pub fn layer_from_raw(
        &self,
        layer_id: impl Into<String>,
        raw_count: i64,
    ) -> Result<LayerLoadManager, LoadError> {
        let declared_count = validate_feature_count(raw_count)?;
        Ok(self.layer(layer_id, declared_count))
    }

    /// Drop every cached result for a layer.
    ///
    /// Call after the layer's underlying data changed (e.g. a new upload);
    /// the next resolve refetches.
    pub fn invalidate_layer(&self, layer_id: &str) {
        self.cache.invalidate_layer(layer_id);
    }

    /// The shared request cache.
    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    /// Snapshot of request cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::MockLayerDataClient;
    use crate::strategy::LoadingStrategy;

    fn engine() -> (LayerLoadEngine, Arc<MockLayerDataClient>) {
        let client = Arc::new(MockLayerDataClient::default());
        let engine = LayerLoadEngine::new(EngineConfig::default(), client.clone())
            .expect("default config is valid");
        (engine, client)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.thresholds.tile_handoff_max = 0;
        let client = Arc::new(MockLayerDataClient::default());
        assert!(LayerLoadEngine::new(config, client).is_err());
    }

    #[test]
    fn test_layer_classification_per_band() {
        let (engine, _) = engine();
        assert_eq!(
            engine.layer("a", 500).strategy(),
            LoadingStrategy::FullCollection
        );
        assert_eq!(
            engine.layer("b", 12_000).strategy(),
            LoadingStrategy::ViewportBounded
        );
        assert_eq!(
            engine.layer("c", 50_000).strategy(),
            LoadingStrategy::TileHandoff
        );
        assert_eq!(
            engine.layer("d", 150_000).strategy(),
            LoadingStrategy::TileOnly
        );
    }

    #[test]
    fn test_layer_from_raw_rejects_negative() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.layer_from_raw("bad", -5),
            Err(LoadError::InvalidFeatureCount(-5))
        ));
        assert!(engine.layer_from_raw("good", 42).is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_layer_forces_refetch() {
        let (engine, client) = engine();
        let manager = engine.layer("parcels", 500);

        manager.resolve(None).await;
        manager.resolve(None).await;
        assert_eq!(client.full_calls(), 1);

        engine.invalidate_layer("parcels");
        engine.cache().run_pending_tasks().await;

        manager.resolve(None).await;
        assert_eq!(client.full_calls(), 2);
    }

    #[tokio::test]
    async fn test_managers_share_the_cache() {
        let (engine, client) = engine();
        let a = engine.layer("parcels", 500);
        let b = engine.layer("parcels", 500);

        a.resolve(None).await;
        b.resolve(None).await;

        // Same layer, same key: the second manager hits the shared cache.
        assert_eq!(client.full_calls(), 1);
        assert_eq!(engine.cache_stats().hits, 1);
    }
}
