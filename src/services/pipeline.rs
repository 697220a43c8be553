//! The two request flows, composed from the ingestion, transform and
//! output steps.
//!
//! Both functions are blocking and are meant to run on a blocking thread.
//! The extraction directory lives in an [`ExtractedLayer`] local, so it is
//! removed on every return path, including `?` early exits.

use geojson::FeatureCollection;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{BufferResponse, Crs, EPSG_WEB_MERCATOR, EPSG_WGS84, VectorDataset};
use crate::services::archive::{ExtractedLayer, UploadedArchive};
use crate::services::buffer::{DEFAULT_BUFFER_DISTANCE, buffer_dataset};
use crate::services::loader::load_dataset;
use crate::services::output::OutputStore;
use crate::services::reproject::to_crs;
use crate::services::serializer::to_feature_collection;

/// Parse the optional `buffer_distance` form value.
///
/// Absent means the default. A present value, blank included, must parse
/// as a float; failure is a processing error, not a validation error.
pub fn parse_buffer_distance(raw: Option<&str>) -> AppResult<f64> {
    match raw {
        None => Ok(DEFAULT_BUFFER_DISTANCE),
        Some(text) => Ok(text.trim().parse::<f64>()?),
    }
}

/// Upload-and-normalize: validate, reproject to EPSG:4326 if needed and
/// return the layer as GeoJSON.
pub fn upload_and_normalize(archive: UploadedArchive) -> AppResult<FeatureCollection> {
    let layer = ExtractedLayer::extract(&archive)?;
    let dataset = load_layer(&layer)?;

    if dataset.is_empty() {
        return Err(AppError::EmptyDataset);
    }
    let crs = dataset.crs.clone().ok_or(AppError::UndefinedCrs)?;

    let dataset = if crs.is_epsg(EPSG_WGS84) {
        dataset
    } else {
        to_crs(dataset, &Crs::epsg(EPSG_WGS84))?
    };

    Ok(to_feature_collection(&dataset))
}

/// Buffer operation: buffer every feature by `distance` meters in
/// EPSG:3857, return to EPSG:4326, persist the result and describe it.
pub fn buffer_operation(
    archive: UploadedArchive,
    distance: f64,
    store: &OutputStore,
) -> AppResult<BufferResponse> {
    let layer = ExtractedLayer::extract(&archive)?;
    let dataset = load_layer(&layer)?;

    if dataset.crs.is_none() {
        return Err(AppError::UndefinedCrs);
    }

    let metric = to_crs(dataset, &Crs::epsg(EPSG_WEB_MERCATOR))?;
    let buffered = buffer_dataset(metric, distance);
    let geographic = to_crs(buffered, &Crs::epsg(EPSG_WGS84))?;

    let artifact = store.persist(&geographic)?;
    info!(
        "Buffered {} features by {} m into {}",
        geographic.len(),
        distance,
        artifact.uid
    );
    let vanished = null_geometry_count(&geographic);
    if vanished > 0 {
        info!(
            "Shapefile {} holds {} of {} features; {} empty buffers are null in the response only",
            artifact.uid,
            geographic.len() - vanished,
            geographic.len(),
            vanished
        );
    }

    Ok(BufferResponse {
        geojson: to_feature_collection(&geographic),
        buffer_distance: distance,
        shapefile_uid: artifact.uid,
    })
}

/// Features the persisted shapefile leaves out.
fn null_geometry_count(dataset: &VectorDataset) -> usize {
    dataset
        .features
        .iter()
        .filter(|feature| feature.geometry.is_none())
        .count()
}

fn load_layer(layer: &ExtractedLayer) -> AppResult<VectorDataset> {
    let shp_path = layer.locate_shapefile()?;
    info!("Using {}", shp_path.display());
    load_dataset(&shp_path)
}
