//! Response bodies returned by the shapefile endpoints.

use geojson::FeatureCollection;
use serde::Serialize;
use utoipa::ToSchema;

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub status: &'static str,
}

/// Result of a buffer operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct BufferResponse {
    /// Buffered features in EPSG:4326.
    #[schema(value_type = Object)]
    pub geojson: FeatureCollection,
    /// Distance actually applied, in meters.
    pub buffer_distance: f64,
    /// Identifier of the persisted shapefile and its zip archive.
    #[schema(example = "3f2b8c1e9d7a4b6c8e0f1a2b3c4d5e6f")]
    pub shapefile_uid: String,
}
