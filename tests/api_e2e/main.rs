//! API E2E test suite.
//!
//! Drives the shapefile endpoints through the full actix service with
//! shapefile fixtures built in-process. Reprojection needs a PROJ database
//! on the host.
//!
//! Run with: cargo test --test api_e2e

mod test_helpers;

mod test_media;
mod test_ping;
mod test_upload;
