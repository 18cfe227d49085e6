//! Error taxonomy for layer loading.
//!
//! All load failures are carried as values inside
//! [`LoadResult::Failed`](crate::result::LoadResult::Failed); nothing in the
//! engine panics or lets an error escape into rendering code. The engine
//! performs no automatic retry. Re-invoking `resolve` on the next viewport
//! settle naturally retries bounded loads; anything beyond that is the
//! caller's policy.

use thiserror::Error;

use crate::geo::BoundsError;

/// Errors surfaced by the loading engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// A viewport-bounded load was invoked without a viewport.
    ///
    /// This is a programming error in the caller, fatal to that call and
    /// never retried by the engine.
    #[error("viewport-bounded load requires a viewport")]
    MissingViewport,

    /// A network fetch failed.
    ///
    /// Transient. The failure is negative-cached briefly to avoid request
    /// storms against a persistently broken layer; the caller may retry.
    #[error("network failure: {0}")]
    Network(String),

    /// A raw feature count from external metadata was negative.
    ///
    /// Rejected at the engine boundary before classification.
    #[error("invalid feature count: {0}")]
    InvalidFeatureCount(i64),

    /// The supplied viewport bounds were malformed.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Validate a raw feature count reported by external metadata.
///
/// Server-side layer metadata arrives as a signed integer; anything
/// negative never reaches the classifier.
pub fn validate_feature_count(raw: i64) -> Result<u64, LoadError> {
    u64::try_from(raw).map_err(|_| LoadError::InvalidFeatureCount(raw))
}
