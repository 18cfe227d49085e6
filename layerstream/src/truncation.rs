//! Truncation advisory messages.
//!
//! When a bounded response is capped below the true matching count, the
//! user should hear about it once, in one sentence. Pure formatting; no
//! state and no effect on loading.

use crate::client::TruncationMeta;

/// Build the advisory string for a capped response.
///
/// Returns `None` when the response was not limited.
pub fn truncation_advisory(meta: &TruncationMeta) -> Option<String> {
    if !meta.limited {
        return None;
    }
    Some(format!(
        "Showing {} of {} features in this area. Zoom in to see more.",
        meta.returned, meta.total_in_bounds
    ))
}
