//! Feature-count classification into loading strategies.
//!
//! Thresholds are exclusive upper bounds: a layer with exactly
//! `full_collection_max` features is already too large for a full load and
//! is classified `ViewportBounded`. The reference thresholds are
//! 10,000 / 20,000 / 100,000 features.

/// Default upper bound (exclusive) for loading a full collection.
pub const DEFAULT_FULL_COLLECTION_MAX: u64 = 10_000;

/// Default upper bound (exclusive) for viewport-bounded loading.
pub const DEFAULT_VIEWPORT_BOUNDED_MAX: u64 = 20_000;

/// Default upper bound (exclusive) for tile handoff with feature details.
pub const DEFAULT_TILE_HANDOFF_MAX: u64 = 100_000;

/// How a layer's data is fetched and refreshed.
///
/// Exactly one strategy is active per layer at any time, derived purely
/// from the declared feature count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingStrategy {
    /// Fetch the entire feature collection once; cache until invalidation.
    FullCollection,
    /// Fetch only features intersecting the current viewport, server-capped.
    ViewportBounded,
    /// Render from vector tiles; feature details fetched on demand.
    TileHandoff,
    /// Render from vector tiles only; no feature fetches at all.
    TileOnly,
}

impl LoadingStrategy {
    /// Whether this strategy renders from a tile endpoint.
    pub fn uses_tiles(&self) -> bool {
        matches!(self, LoadingStrategy::TileHandoff | LoadingStrategy::TileOnly)
    }
}

impl std::fmt::Display for LoadingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadingStrategy::FullCollection => "full-collection",
            LoadingStrategy::ViewportBounded => "viewport-bounded",
            LoadingStrategy::TileHandoff => "tile-handoff",
            LoadingStrategy::TileOnly => "tile-only",
        };
        f.write_str(name)
    }
}

/// Feature-count boundaries between loading strategies.
///
/// Each field is the exclusive upper bound of its band. The bounds must be
/// strictly increasing and nonzero; [`crate::config::EngineConfig::validate`]
/// enforces this at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyThresholds {
    /// Counts below this load the full collection.
    pub full_collection_max: u64,
    /// Counts below this (and at or above `full_collection_max`) load per viewport.
    pub viewport_bounded_max: u64,
    /// Counts below this (and at or above `viewport_bounded_max`) hand off to
    /// tiles with on-demand feature details; counts at or above it are tile-only.
    pub tile_handoff_max: u64,
}

impl Default for StrategyThresholds {
    fn default() -> Self {
        Self {
            full_collection_max: DEFAULT_FULL_COLLECTION_MAX,
            viewport_bounded_max: DEFAULT_VIEWPORT_BOUNDED_MAX,
            tile_handoff_max: DEFAULT_TILE_HANDOFF_MAX,
        }
    }
}

impl StrategyThresholds {
    /// Classify a declared feature count into a loading strategy.
    ///
    /// Pure and total over all `u64` counts.
    pub fn classify(&self, feature_count: u64) -> LoadingStrategy {
        if feature_count < self.full_collection_max {
            LoadingStrategy::FullCollection
        } else if feature_count < self.viewport_bounded_max {
            LoadingStrategy::ViewportBounded
        } else if feature_count < self.tile_handoff_max {
            LoadingStrategy::TileHandoff
        } else {
            LoadingStrategy::TileOnly
        }
    }

    /// Whether a layer of this size should be clustered at low zoom.
    ///
    /// Clustering is a point-density hint, independent of the tile
    /// transport decision; every layer too large for a full load gets it.
    pub fn wants_clustering(&self, feature_count: u64) -> bool {
        feature_count >= self.full_collection_max
    }
}
