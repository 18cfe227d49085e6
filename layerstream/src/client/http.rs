//! HTTP-backed layer data client using reqwest.

use serde::Deserialize;

use crate::geo::SpatialBounds;

use super::types::{
    BoundedFeatures, ClientError, ClusterCollection, Feature, FeatureCollection, TruncationMeta,
};
use super::{BoxFuture, LayerDataClient};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Layer data client backed by a shared `reqwest` client.
///
/// Endpoint layout, relative to the configured base URL:
///
/// - `GET /layers/{id}/features/all` - full collection
/// - `GET /layers/{id}/features?bbox=w,s,e,n&limit=N&simplify=bool` - bounded
/// - `GET /layers/{id}/clusters?bbox=w,s,e,n&zoom=Z` - cluster markers
/// - `/layers/{id}/tiles/{z}/{x}/{y}.pbf` - vector tile template (no fetch)
pub struct HttpLayerDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLayerDataClient {
    /// Create a client against the given API base URL.
    ///
    /// A trailing slash on `base_url` is trimmed so endpoint paths join
    /// cleanly.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Http(format!("failed to create HTTP client: {e}")))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to decode response: {e}")))
    }
}

/// Format bounds as a `west,south,east,north` bbox query parameter.
fn bbox_param(bounds: &SpatialBounds) -> String {
    format!(
        "{},{},{},{}",
        bounds.west, bounds.south, bounds.east, bounds.north
    )
}

/// Wire shape of a bounded feature response.
#[derive(Debug, Deserialize)]
struct BoundedWire {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    total_in_bounds: u64,
    #[serde(default)]
    returned: u64,
    #[serde(default)]
    limited: bool,
}

impl From<BoundedWire> for BoundedFeatures {
    fn from(wire: BoundedWire) -> Self {
        Self {
            collection: FeatureCollection {
                features: wire.features,
            },
            meta: TruncationMeta {
                total_in_bounds: wire.total_in_bounds,
                returned: wire.returned,
                limited: wire.limited,
            },
        }
    }
}

impl LayerDataClient for HttpLayerDataClient {
    fn fetch_full_collection<'a>(
        &'a self,
        layer_id: &'a str,
    ) -> BoxFuture<'a, Result<FeatureCollection, ClientError>> {
        Box::pin(async move {
            let url = format!("{}/layers/{}/features/all", self.base_url, layer_id);
            self.get_json::<FeatureCollection>(url, &[]).await
        })
    }

    fn fetch_bounded_features<'a>(
        &'a self,
        layer_id: &'a str,
        bounds: SpatialBounds,
        max_features: u32,
        simplify: bool,
    ) -> BoxFuture<'a, Result<BoundedFeatures, ClientError>> {
        Box::pin(async move {
            let url = format!("{}/layers/{}/features", self.base_url, layer_id);
            let query = [
                ("bbox", bbox_param(&bounds)),
                ("limit", max_features.to_string()),
                ("simplify", simplify.to_string()),
            ];
            let wire = self.get_json::<BoundedWire>(url, &query).await?;
            Ok(wire.into())
        })
    }

    fn fetch_clusters<'a>(
        &'a self,
        layer_id: &'a str,
        bounds: SpatialBounds,
        zoom: u8,
    ) -> BoxFuture<'a, Result<ClusterCollection, ClientError>> {
        Box::pin(async move {
            let url = format!("{}/layers/{}/clusters", self.base_url, layer_id);
            let query = [("bbox", bbox_param(&bounds)), ("zoom", zoom.to_string())];
            self.get_json::<ClusterCollection>(url, &query).await
        })
    }

    fn tile_endpoint(&self, layer_id: &str) -> String {
        format!(
            "{}/layers/{}/tiles/{{z}}/{{x}}/{{y}}.pbf",
            self.base_url, layer_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tile_endpoint_template() {
        let client = HttpLayerDataClient::new("https://gis.example.test/api/").unwrap();
        assert_eq!(
            client.tile_endpoint("parcels"),
            "https://gis.example.test/api/layers/parcels/tiles/{z}/{x}/{y}.pbf"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpLayerDataClient::new("https://gis.example.test/api///").unwrap();
        assert!(client
            .tile_endpoint("a")
            .starts_with("https://gis.example.test/api/layers/"));
    }

    #[test]
    fn test_bbox_param_format() {
        let bounds = SpatialBounds::new(-74.1, 40.6, -73.9, 40.8);
        assert_eq!(bbox_param(&bounds), "-74.1,40.6,-73.9,40.8");
    }

    #[test]
    fn test_bounded_wire_decodes() {
        let raw = json!({
            "features": [
                {"geometry": {"type": "Point", "coordinates": [0.0, 0.0]}, "properties": {}}
            ],
            "total_in_bounds": 50000,
            "returned": 4000,
            "limited": true
        });
        let wire: BoundedWire = serde_json::from_value(raw).unwrap();
        let bounded: BoundedFeatures = wire.into();
        assert_eq!(bounded.collection.len(), 1);
        assert_eq!(bounded.meta.total_in_bounds, 50_000);
        assert_eq!(bounded.meta.returned, 4_000);
        assert!(bounded.meta.limited);
    }

    #[test]
    fn test_bounded_wire_defaults_when_meta_absent() {
        let wire: BoundedWire = serde_json::from_value(json!({"features": []})).unwrap();
        let bounded: BoundedFeatures = wire.into();
        assert!(!bounded.meta.limited);
        assert_eq!(bounded.meta.returned, 0);
    }
}
