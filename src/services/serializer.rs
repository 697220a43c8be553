//! Response serializer: GeoJSON form of a dataset.

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, Value};

use crate::models::VectorDataset;

/// Convert `dataset` into a FeatureCollection.
///
/// Each feature's `id` is its zero-based position as a string; properties
/// keep the attribute table's column order. Output is a pure function of the
/// dataset, so the same input always serializes to the same bytes.
pub fn to_feature_collection(dataset: &VectorDataset) -> FeatureCollection {
    let features = dataset
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| Feature {
            bbox: None,
            geometry: feature
                .geometry
                .as_ref()
                .map(|geometry| Geometry::new(Value::from(geometry))),
            id: Some(Id::String(index.to_string())),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
