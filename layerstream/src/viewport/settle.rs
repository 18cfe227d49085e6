//! Movement-settle detection.
//!
//! A burst of move/zoom events coalesces into one snapshot carrying the
//! final bounds, emitted once no event has arrived for the settle
//! threshold. Last write wins within a burst. The detector is driven by
//! explicit timestamps so it can be tested without a runtime; the async
//! pump in [`super::tracker`] feeds it wall-clock time.

use std::time::{Duration, Instant};

use crate::geo::SpatialBounds;

use super::ViewportSnapshot;

/// Configuration for settle detection.
#[derive(Debug, Clone)]
pub struct SettleConfig {
    /// Quiet time after the last movement that marks a viewport as settled.
    pub settle_threshold: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            settle_threshold: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingViewport {
    bounds: SpatialBounds,
    zoom: u8,
}

/// State machine turning raw movement events into settled snapshots.
#[derive(Debug)]
pub struct SettleDetector {
    config: SettleConfig,

    /// The most recent unsettled viewport, if any.
    pending: Option<PendingViewport>,

    /// Timestamp of the last recorded movement.
    last_movement: Option<Instant>,

    /// Next sequence number to assign.
    next_seq: u64,

    /// Highest sequence number emitted so far.
    last_emitted_seq: u64,
}

impl SettleDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: SettleConfig) -> Self {
        Self {
            config,
            pending: None,
            last_movement: None,
            next_seq: 1,
            last_emitted_seq: 0,
        }
    }

    /// Create a detector with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SettleConfig::default())
    }

    /// Record a raw move/zoom event.
    ///
    /// Overwrites any pending viewport from the same burst; only the final
    /// bounds of a burst are ever emitted.
    pub fn record_movement(&mut self, bounds: SpatialBounds, zoom: u8, now: Instant) {
        self.pending = Some(PendingViewport { bounds, zoom });
        self.last_movement = Some(now);
    }

    /// Emit a snapshot if the viewport has settled.
    ///
    /// Returns `Some` at most once per burst, once `settle_threshold` has
    /// elapsed since the last movement. Sequence numbers are strictly
    /// increasing; an emitted snapshot never repeats or lowers a sequence.
    pub fn check_settled(&mut self, now: Instant) -> Option<ViewportSnapshot> {
        let last = self.last_movement?;
        if now.saturating_duration_since(last) < self.config.settle_threshold {
            return None;
        }
        let pending = self.pending.take()?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.last_emitted_seq = seq;

        Some(ViewportSnapshot {
            bounds: pending.bounds,
            zoom: pending.zoom,
            seq,
        })
    }

    /// Whether a burst is in progress (events recorded but not yet settled).
    pub fn is_moving(&self) -> bool {
        self.pending.is_some()
    }

    /// The highest sequence number emitted so far (0 before any emission).
    pub fn last_emitted_seq(&self) -> u64 {
        self.last_emitted_seq
    }

    /// The active configuration.
    pub fn config(&self) -> &SettleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(west: f64) -> SpatialBounds {
        SpatialBounds::new(west, 50.0, west + 1.0, 51.0)
    }

    fn detector_with_threshold(ms: u64) -> SettleDetector {
        SettleDetector::new(SettleConfig {
            settle_threshold: Duration::from_millis(ms),
        })
    }

    #[test]
    fn test_no_emission_before_threshold() {
        let mut detector = detector_with_threshold(100);
        let start = Instant::now();

        detector.record_movement(bounds(9.0), 12, start);
        assert!(detector.is_moving());
        assert!(detector
            .check_settled(start + Duration::from_millis(50))
            .is_none());
    }

    #[test]
    fn test_emission_after_quiet_period() {
        let mut detector = detector_with_threshold(100);
        let start = Instant::now();

        detector.record_movement(bounds(9.0), 12, start);
        let snapshot = detector
            .check_settled(start + Duration::from_millis(150))
            .unwrap();

        assert_eq!(snapshot.bounds, bounds(9.0));
        assert_eq!(snapshot.zoom, 12);
        assert_eq!(snapshot.seq, 1);
        assert!(!detector.is_moving());
    }

    #[test]
    fn test_burst_emits_final_bounds_only() {
        let mut detector = detector_with_threshold(100);
        let start = Instant::now();

        // Pan gesture: three intermediate viewports inside one burst.
        detector.record_movement(bounds(9.0), 12, start);
        detector.record_movement(bounds(9.5), 12, start + Duration::from_millis(30));
        detector.record_movement(bounds(10.0), 13, start + Duration::from_millis(60));

        // Not yet settled relative to the last movement.
        assert!(detector
            .check_settled(start + Duration::from_millis(120))
            .is_none());

        let snapshot = detector
            .check_settled(start + Duration::from_millis(200))
            .unwrap();
        assert_eq!(snapshot.bounds, bounds(10.0));
        assert_eq!(snapshot.zoom, 13);
        assert_eq!(snapshot.seq, 1);
    }

    #[test]
    fn test_emits_at_most_once_per_burst() {
        let mut detector = detector_with_threshold(50);
        let start = Instant::now();

        detector.record_movement(bounds(9.0), 12, start);
        assert!(detector
            .check_settled(start + Duration::from_millis(100))
            .is_some());
        assert!(detector
            .check_settled(start + Duration::from_millis(200))
            .is_none());
    }

    #[test]
    fn test_sequence_numbers_strictly_increase() {
        let mut detector = detector_with_threshold(50);
        let start = Instant::now();
        let mut last_seq = 0;

        for i in 0..5u64 {
            let at = start + Duration::from_millis(i * 200);
            detector.record_movement(bounds(9.0 + i as f64), 12, at);
            let snapshot = detector
                .check_settled(at + Duration::from_millis(100))
                .unwrap();
            assert!(snapshot.seq > last_seq);
            last_seq = snapshot.seq;
        }

        assert_eq!(detector.last_emitted_seq(), last_seq);
    }

    #[test]
    fn test_no_emission_without_movement() {
        let mut detector = SettleDetector::with_defaults();
        assert!(detector.check_settled(Instant::now()).is_none());
        assert!(!detector.is_moving());
    }

    #[test]
    fn test_default_threshold() {
        let config = SettleConfig::default();
        assert_eq!(config.settle_threshold, Duration::from_millis(250));
    }
}
