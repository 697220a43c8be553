//! In-memory vector layer: features, attribute schema and CRS.

use geo::Geometry;
use serde_json::{Map, Value};

use crate::models::Crs;

/// Storage kind of a `.dbf` attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Character,
    Numeric,
    Integer,
    Logical,
    Date,
    /// Any other dBase type, carried as text.
    Text,
}

/// One attribute column of the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeField {
    pub name: String,
    pub kind: AttributeKind,
    /// Declared width in the source table.
    pub length: u8,
}

/// A feature record: optional geometry plus ordered attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` for null shapes.
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

/// A table of features with a declared CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDataset {
    pub fields: Vec<AttributeField>,
    pub features: Vec<Feature>,
    pub crs: Option<Crs>,
}

impl VectorDataset {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Replace every non-null geometry, keeping attributes and order.
    pub fn try_map_geometries<E, F>(mut self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&Geometry<f64>) -> Result<Geometry<f64>, E>,
    {
        for feature in &mut self.features {
            if let Some(geometry) = feature.geometry.as_ref() {
                feature.geometry = Some(f(geometry)?);
            }
        }
        Ok(self)
    }
}
