//! GIS shapefile server library.
//!
//! Accepts zipped shapefiles over HTTP, normalizes them to EPSG:4326 and
//! computes planar buffers, returning GeoJSON.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
