//! Engine configuration.
//!
//! Everything the engine needs to know is fixed at construction: strategy
//! thresholds, the bounded-load cap, cache freshness windows, and the
//! viewport settle threshold. There is no process-wide configuration;
//! tests construct engines with whatever thresholds they need.

use thiserror::Error;

use crate::cache::CacheConfig;
use crate::strategy::StrategyThresholds;
use crate::viewport::SettleConfig;

/// Default server-side cap for viewport-bounded loads.
pub const DEFAULT_MAX_FEATURES: u32 = 5_000;

/// Errors from validating an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Strategy thresholds must be strictly increasing.
    #[error(
        "strategy thresholds must be strictly increasing: {full} < {bounded} < {tile} violated"
    )]
    ThresholdsNotIncreasing { full: u64, bounded: u64, tile: u64 },

    /// The lowest threshold must be nonzero, or every layer is tile-bound.
    #[error("full-collection threshold must be nonzero")]
    ZeroThreshold,

    /// The bounded-load cap must be nonzero.
    #[error("max_features must be nonzero")]
    ZeroMaxFeatures,
}

/// Construction-time configuration for the loading engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Feature-count boundaries between loading strategies.
    pub thresholds: StrategyThresholds,
    /// Server-side cap for viewport-bounded loads. Default: 5,000.
    pub max_features: u32,
    /// Whether bounded loads request geometry simplification by default.
    pub simplify_default: bool,
    /// Request cache freshness windows and capacity.
    pub cache: CacheConfig,
    /// Viewport settle detection.
    pub settle: SettleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: StrategyThresholds::default(),
            max_features: DEFAULT_MAX_FEATURES,
            simplify_default: true,
            cache: CacheConfig::default(),
            settle: SettleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate threshold ordering and limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if t.full_collection_max == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if t.full_collection_max >= t.viewport_bounded_max
            || t.viewport_bounded_max >= t.tile_handoff_max
        {
            return Err(ConfigError::ThresholdsNotIncreasing {
                full: t.full_collection_max,
                bounded: t.viewport_bounded_max,
                tile: t.tile_handoff_max,
            });
        }
        if self.max_features == 0 {
            return Err(ConfigError::ZeroMaxFeatures);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(EngineConfig::default().max_features, DEFAULT_MAX_FEATURES);
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = EngineConfig::default();
        config.thresholds.viewport_bounded_max = config.thresholds.tile_handoff_max;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdsNotIncreasing { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let mut config = EngineConfig::default();
        config.thresholds.full_collection_max = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
    }

    #[test]
    fn test_rejects_zero_max_features() {
        let config = EngineConfig {
            max_features: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxFeatures));
    }
}
