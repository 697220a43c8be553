//! Planar buffer of every feature in a metric dataset.

use geo::{Buffer, Geometry, MultiPolygon};
use tracing::debug;

use crate::models::VectorDataset;

/// Default distance when the request carries no `buffer_distance`.
pub const DEFAULT_BUFFER_DISTANCE: f64 = 100.0;

/// Replace every geometry with its buffer polygon at `distance`, in the
/// dataset's linear units.
///
/// Attributes, feature order and count are preserved. The distance is used
/// as given: zero and negative values follow the buffering algorithm's own
/// conventions. A buffer that covers nothing (a point at distance 0, a
/// polygon shrunk away) becomes a null geometry.
pub fn buffer_dataset(mut dataset: VectorDataset, distance: f64) -> VectorDataset {
    debug!("Buffering {} features by {}", dataset.len(), distance);

    for feature in &mut dataset.features {
        feature.geometry = feature
            .geometry
            .as_ref()
            .and_then(|geometry| buffer_geometry(geometry, distance));
    }
    dataset
}

/// Buffer one geometry, collapsing a single-part result to a `Polygon`.
pub fn buffer_geometry(geometry: &Geometry<f64>, distance: f64) -> Option<Geometry<f64>> {
    let MultiPolygon(mut polygons) = geometry.buffer(distance);
    match polygons.len() {
        0 => None,
        1 => Some(Geometry::Polygon(polygons.remove(0))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon(polygons))),
    }
}
