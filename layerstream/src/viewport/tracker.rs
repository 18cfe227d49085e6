//! Async viewport tracking task.
//!
//! Bridges the host map's raw event stream onto the settle detector and
//! publishes settled snapshots through a watch channel. Consumers that
//! only care about the current viewport read the watch receiver; stale
//! intermediate values are overwritten before anyone sees them.

use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::geo::SpatialBounds;

use super::settle::{SettleConfig, SettleDetector};
use super::ViewportSnapshot;

/// A raw move/zoom event from the host map surface.
#[derive(Debug, Clone, Copy)]
pub struct ViewportEvent {
    /// The visible bounds after the event.
    pub bounds: SpatialBounds,
    /// The zoom level after the event.
    pub zoom: u8,
}

/// Spawn the viewport tracking task.
///
/// Reads raw events from `events`, runs settle detection, and publishes
/// each settled [`ViewportSnapshot`] to the returned watch receiver. The
/// task stops when `cancel` fires or the event channel closes.
pub fn spawn_viewport_tracker(
    config: SettleConfig,
    mut events: mpsc::UnboundedReceiver<ViewportEvent>,
    cancel: CancellationToken,
) -> (watch::Receiver<Option<ViewportSnapshot>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut detector = SettleDetector::new(config.clone());
        // Poll for settlement a few times per threshold so emission lag
        // stays well under one threshold.
        let poll_interval = (config.settle_threshold / 4).max(std::time::Duration::from_millis(10));
        let mut tick = tokio::time::interval(poll_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("viewport tracker cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        detector.record_movement(event.bounds, event.zoom, Instant::now());
                    }
                    None => {
                        debug!("viewport event channel closed");
                        break;
                    }
                },
                _ = tick.tick() => {
                    if let Some(snapshot) = detector.check_settled(Instant::now()) {
                        debug!(seq = snapshot.seq, zoom = snapshot.zoom, "viewport settled");
                        if tx.send(Some(snapshot)).is_err() {
                            // No consumers left.
                            break;
                        }
                    }
                }
            }
        }
    });

    (rx, handle)
}
