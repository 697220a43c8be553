//! Shapefile ingestion and spatial-transform pipeline.

pub mod archive;
pub mod buffer;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reproject;
pub mod serializer;

pub use archive::{ExtractedLayer, UploadedArchive};
pub use output::{OutputArtifact, OutputStore};
pub use pipeline::{buffer_operation, parse_buffer_distance, upload_and_normalize};
