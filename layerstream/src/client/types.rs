//! Wire types exchanged with the layer data backend.
//!
//! The engine treats geometry as opaque JSON; it reasons only about
//! feature counts and spatial bounds. These types mirror the GeoJSON-shaped
//! payloads the backend serves, plus the truncation metadata attached to
//! bounded responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from the data-access client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("http {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// One discrete geospatial record with opaque geometry and properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Optional feature identifier as served by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Raw GeoJSON geometry; the engine never inspects it.
    pub geometry: Value,
    /// Feature properties; opaque to the engine.
    #[serde(default)]
    pub properties: Value,
}

/// An ordered set of features.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// The features, in server order.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of features in the collection.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Server-reported counts indicating whether a bounded response was capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TruncationMeta {
    /// Features matching the requested bounds before capping.
    pub total_in_bounds: u64,
    /// Features actually returned.
    pub returned: u64,
    /// Whether the response was capped below the true matching count.
    pub limited: bool,
}

/// A bounded feature response: the clipped collection plus its truncation
/// metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedFeatures {
    /// Features intersecting the requested bounds, possibly capped.
    pub collection: FeatureCollection,
    /// Counts describing the capping, if any.
    pub meta: TruncationMeta,
}

/// An aggregated point marker standing in for many nearby features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster centroid longitude in degrees.
    pub lon: f64,
    /// Cluster centroid latitude in degrees.
    pub lat: f64,
    /// Number of features aggregated into this marker.
    pub count: u64,
}

/// A set of cluster markers for one viewport and zoom level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterCollection {
    /// The cluster markers.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}
