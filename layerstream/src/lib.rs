//! Layerstream - adaptive layer loading for geospatial map surfaces.
//!
//! Decides, for a dataset of unknown and potentially enormous size, how to
//! fetch and refresh feature data as a user pans and zooms a map: small
//! layers load whole, mid-size layers load per viewport, and very large
//! layers hand off to vector tiles. A shared request cache deduplicates
//! concurrent fetches and bounds request volume; viewport settle detection
//! rate-limits refetching during pan gestures.
//!
//! # High-Level API
//!
//! ```ignore
//! use layerstream::{EngineConfig, HttpLayerDataClient, LayerLoadEngine};
//! use std::sync::Arc;
//!
//! let client = Arc::new(HttpLayerDataClient::new("https://gis.example.com/api")?);
//! let engine = LayerLoadEngine::new(EngineConfig::default(), client)?;
//!
//! let layer = engine.layer("parcels", 12_000);
//! let result = layer.resolve(Some(&viewport)).await;
//! ```
//!
//! The engine's contract ends at producing either a bounded feature
//! collection or a tile-endpoint descriptor; rendering belongs to the
//! host.

pub mod cache;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod logging;
pub mod manager;
pub mod result;
pub mod strategy;
pub mod truncation;
pub mod viewport;

pub use cache::{CacheConfig, CacheStats, RequestCache};
pub use client::{HttpLayerDataClient, LayerDataClient};
pub use config::{ConfigError, EngineConfig};
pub use engine::LayerLoadEngine;
pub use error::LoadError;
pub use geo::SpatialBounds;
pub use manager::{LayerLoadManager, LoadPhase};
pub use result::LoadResult;
pub use strategy::{LoadingStrategy, StrategyThresholds};
pub use viewport::{SettleConfig, ViewportSnapshot};

/// Version of the layerstream library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
