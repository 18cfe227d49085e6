//! Request identity for caching and deduplication.

use crate::geo::{BoundsKey, SpatialBounds};
use crate::strategy::LoadingStrategy;

/// Which kind of payload a request fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Feature collections (full or bounded).
    Features,
    /// Cluster markers.
    Clusters,
}

/// Identity of a logical fetch.
///
/// Two requests with the same key are the same fetch and must be
/// deduplicated. Viewport sequence numbers are deliberately absent:
/// re-resolving an identical viewport joins the cached or in-flight
/// request instead of issuing a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// The layer this request belongs to.
    pub layer_id: String,
    /// Payload kind.
    pub kind: RequestKind,
    /// Strategy active when the request was formed.
    pub strategy: LoadingStrategy,
    /// Quantized bounds; `None` for full-collection fetches.
    pub bounds: Option<BoundsKey>,
    /// Zoom level; set for cluster fetches.
    pub zoom: Option<u8>,
    /// Server-side cap; set for bounded fetches.
    pub max_features: Option<u32>,
    /// Whether geometry simplification was requested.
    pub simplify: bool,
}

impl RequestKey {
    /// Key for a full-collection fetch.
    pub fn full_collection(layer_id: &str) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            kind: RequestKind::Features,
            strategy: LoadingStrategy::FullCollection,
            bounds: None,
            zoom: None,
            max_features: None,
            simplify: false,
        }
    }

    /// Key for a viewport-bounded feature fetch.
    pub fn bounded(
        layer_id: &str,
        bounds: &SpatialBounds,
        max_features: u32,
        simplify: bool,
    ) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            kind: RequestKind::Features,
            strategy: LoadingStrategy::ViewportBounded,
            bounds: Some(BoundsKey::from(bounds)),
            zoom: None,
            max_features: Some(max_features),
            simplify,
        }
    }

    /// Key for a cluster fetch.
    pub fn clusters(
        layer_id: &str,
        strategy: LoadingStrategy,
        bounds: &SpatialBounds,
        zoom: u8,
    ) -> Self {
        Self {
            layer_id: layer_id.to_string(),
            kind: RequestKind::Clusters,
            strategy,
            bounds: Some(BoundsKey::from(bounds)),
            zoom: Some(zoom),
            max_features: None,
            simplify: false,
        }
    }
}
