//! Domain models for the shapefile server.

pub mod crs;
pub mod dataset;
pub mod responses;

// Re-export commonly used types
pub use crs::{Crs, EPSG_WEB_MERCATOR, EPSG_WGS84};
pub use dataset::{AttributeField, AttributeKind, Feature, VectorDataset};
pub use responses::{BufferResponse, PingResponse};
