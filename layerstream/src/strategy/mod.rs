//! Loading strategy selection.
//!
//! A layer's declared feature count alone decides how the engine fetches
//! its data: small layers load whole, mid-size layers load per viewport,
//! and very large layers hand off to vector tiles. Classification is a
//! pure function of the count and the configured thresholds, never of
//! prior state.

mod classifier;
mod descriptor;

pub use classifier::{LoadingStrategy, StrategyThresholds};
pub use descriptor::{describe, Severity, StrategyDescriptor};
