//! Data-access abstraction for layer content.
//!
//! The engine's only boundary-facing contract is the [`LayerDataClient`]
//! trait: four HTTP-shaped operations the backend must provide. The trait
//! uses boxed futures so it stays dyn-compatible (`Arc<dyn LayerDataClient>`),
//! which lets tests substitute a mock without generics spreading through
//! the engine.

mod http;
mod types;

pub use http::HttpLayerDataClient;
pub use types::{
    BoundedFeatures, ClientError, Cluster, ClusterCollection, Feature, FeatureCollection,
    TruncationMeta,
};

#[cfg(test)]
pub use mock::MockLayerDataClient;

use std::future::Future;
use std::pin::Pin;

use crate::geo::SpatialBounds;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations the engine requires from the layer data backend.
///
/// Concrete HTTP, auth, and serialization live behind this trait; the
/// engine only sees typed results. All methods except [`tile_endpoint`]
/// suspend on network I/O.
///
/// [`tile_endpoint`]: LayerDataClient::tile_endpoint
pub trait LayerDataClient: Send + Sync {
    /// Fetch a layer's entire feature collection.
    fn fetch_full_collection<'a>(
        &'a self,
        layer_id: &'a str,
    ) -> BoxFuture<'a, Result<FeatureCollection, ClientError>>;

    /// Fetch features intersecting `bounds`, server-capped at `max_features`.
    ///
    /// When `simplify` is set the server may reduce geometry detail to keep
    /// the payload small. The response carries truncation metadata.
    fn fetch_bounded_features<'a>(
        &'a self,
        layer_id: &'a str,
        bounds: SpatialBounds,
        max_features: u32,
        simplify: bool,
    ) -> BoxFuture<'a, Result<BoundedFeatures, ClientError>>;

    /// Fetch cluster markers for `bounds` at the given zoom level.
    fn fetch_clusters<'a>(
        &'a self,
        layer_id: &'a str,
        bounds: SpatialBounds,
        zoom: u8,
    ) -> BoxFuture<'a, Result<ClusterCollection, ClientError>>;

    /// Derive the vector-tile endpoint template for a layer.
    ///
    /// Pure and synchronous; no network.
    fn tile_endpoint(&self, layer_id: &str) -> String;
}

#[cfg(test)]
mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::geo::SpatialBounds;

    use super::*;

    /// Configurable mock client for engine tests.
    ///
    /// Responses are fixed per method; call counters allow asserting how
    /// many network fetches a scenario actually performed. Per-call delays
    /// let tests force out-of-order completion.
    pub struct MockLayerDataClient {
        pub full_response: Result<FeatureCollection, ClientError>,
        pub bounded_response: Result<BoundedFeatures, ClientError>,
        pub cluster_response: Result<ClusterCollection, ClientError>,
        /// Delays popped per bounded call, front first.
        pub bounded_delays: Mutex<VecDeque<Duration>>,
        full_calls: AtomicUsize,
        bounded_calls: AtomicUsize,
        cluster_calls: AtomicUsize,
    }

    impl Default for MockLayerDataClient {
        fn default() -> Self {
            Self {
                full_response: Ok(FeatureCollection::default()),
                bounded_response: Ok(BoundedFeatures {
                    collection: FeatureCollection::default(),
                    meta: TruncationMeta::default(),
                }),
                cluster_response: Ok(ClusterCollection::default()),
                bounded_delays: Mutex::new(VecDeque::new()),
                full_calls: AtomicUsize::new(0),
                bounded_calls: AtomicUsize::new(0),
                cluster_calls: AtomicUsize::new(0),
            }
        }
    }

    impl MockLayerDataClient {
        /// Mock whose bounded fetches fail with the given error.
        pub fn failing_bounded(error: ClientError) -> Self {
            Self {
                bounded_response: Err(error),
                ..Self::default()
            }
        }

        pub fn full_calls(&self) -> usize {
            self.full_calls.load(Ordering::SeqCst)
        }

        pub fn bounded_calls(&self) -> usize {
            self.bounded_calls.load(Ordering::SeqCst)
        }

        pub fn cluster_calls(&self) -> usize {
            self.cluster_calls.load(Ordering::SeqCst)
        }
    }

    impl LayerDataClient for MockLayerDataClient {
        fn fetch_full_collection<'a>(
            &'a self,
            _layer_id: &'a str,
        ) -> BoxFuture<'a, Result<FeatureCollection, ClientError>> {
            self.full_calls.fetch_add(1, Ordering::SeqCst);
            let response = self.full_response.clone();
            Box::pin(async move { response })
        }

        fn fetch_bounded_features<'a>(
            &'a self,
            _layer_id: &'a str,
            _bounds: SpatialBounds,
            _max_features: u32,
            _simplify: bool,
        ) -> BoxFuture<'a, Result<BoundedFeatures, ClientError>> {
            self.bounded_calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.bounded_delays.lock().pop_front();
            let response = self.bounded_response.clone();
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                response
            })
        }

        fn fetch_clusters<'a>(
            &'a self,
            _layer_id: &'a str,
            _bounds: SpatialBounds,
            _zoom: u8,
        ) -> BoxFuture<'a, Result<ClusterCollection, ClientError>> {
            self.cluster_calls.fetch_add(1, Ordering::SeqCst);
            let response = self.cluster_response.clone();
            Box::pin(async move { response })
        }

        fn tile_endpoint(&self, layer_id: &str) -> String {
            format!("mock://tiles/{layer_id}/{{z}}/{{x}}/{{y}}.pbf")
        }
    }
}
