//! Viewport observation and settle detection.
//!
//! The host map surface reports raw move/zoom events in bursts: a single
//! pan gesture produces dozens of intermediate viewports. This module
//! converts that stream into a clean, rate-limited sequence of
//! [`ViewportSnapshot`]s carrying the final bounds of each gesture and a
//! strictly increasing sequence number. Consumers discard any result
//! computed for a stale sequence number.

mod settle;
mod tracker;

pub use settle::{SettleConfig, SettleDetector};
pub use tracker::{spawn_viewport_tracker, ViewportEvent};

use crate::geo::SpatialBounds;

/// One settled view of the map.
///
/// Only the snapshot with the highest sequence number is current; the
/// sequence is strictly monotonic per tracker instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    /// The visible geographic rectangle.
    pub bounds: SpatialBounds,
    /// Integer zoom level of the host map.
    pub zoom: u8,
    /// Monotonically increasing snapshot sequence number.
    pub seq: u64,
}
