//! Uniform load result shape.
//!
//! Every strategy resolves to the same tagged union so callers render one
//! way regardless of how the data was fetched. Results are immutable:
//! a newer result replaces an older one, never mutates it. Collections are
//! reference-counted so cached results clone cheaply into waiters and
//! consumers.

use std::sync::Arc;

use crate::client::{ClusterCollection, FeatureCollection, TruncationMeta};
use crate::error::LoadError;
use crate::truncation::truncation_advisory;

/// Outcome of resolving a layer load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    /// A bounded or full feature collection, with truncation metadata when
    /// the server capped the response.
    Features {
        collection: Arc<FeatureCollection>,
        truncation: Option<TruncationMeta>,
    },

    /// Cluster markers for the current viewport and zoom.
    Clusters(Arc<ClusterCollection>),

    /// A vector-tile endpoint template; no feature data was fetched.
    TileDescriptor(String),

    /// The result was superseded by a newer viewport before it applied;
    /// the consumer keeps whatever it last rendered.
    Pending,

    /// The load failed; see the error for retry eligibility.
    Failed(LoadError),
}

impl LoadResult {
    /// Whether this result is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadResult::Failed(_))
    }

    /// Whether this result was superseded before applying.
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadResult::Pending)
    }

    /// The truncation advisory for this result, if the server clipped it.
    pub fn advisory(&self) -> Option<String> {
        match self {
            LoadResult::Features {
                truncation: Some(meta),
                ..
            } => truncation_advisory(meta),
            _ => None,
        }
    }
}
