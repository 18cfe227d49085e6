//! User-facing strategy descriptions.
//!
//! Maps a strategy to a short label and a severity tier for UI emphasis.
//! Purely presentational; nothing here affects loading behavior.

use super::LoadingStrategy;

/// UI emphasis tier for a strategy description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal operation, no emphasis needed.
    Informational,
    /// The user sees a partial view of the data.
    Advisory,
    /// Feature-level interaction is unavailable.
    Critical,
}

/// Human-readable description of the active loading strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyDescriptor {
    /// Short label embedding the layer's feature count.
    pub label: String,
    /// Emphasis tier for the hosting UI.
    pub severity: Severity,
}

/// Describe a strategy for display.
pub fn describe(strategy: LoadingStrategy, feature_count: u64) -> StrategyDescriptor {
    match strategy {
        LoadingStrategy::FullCollection => StrategyDescriptor {
            label: format!("Loading all {feature_count} features"),
            severity: Severity::Informational,
        },
        LoadingStrategy::ViewportBounded => StrategyDescriptor {
            label: format!(
                "Large layer ({feature_count} features): loading features in the current view"
            ),
            severity: Severity::Advisory,
        },
        LoadingStrategy::TileHandoff => StrategyDescriptor {
            label: format!(
                "Very large layer ({feature_count} features): rendering tiles, details on demand"
            ),
            severity: Severity::Advisory,
        },
        LoadingStrategy::TileOnly => StrategyDescriptor {
            label: format!("Massive layer ({feature_count} features): tile rendering only"),
            severity: Severity::Critical,
        },
    }
}
