//! API endpoint modules.

pub mod health;
pub mod media;
pub mod openapi;
pub mod shapefiles;

pub use health::configure_health_routes;
pub use media::configure_routes as configure_media_routes;
pub use openapi::ApiDoc;
pub use openapi::configure_routes as configure_openapi_routes;
pub use shapefiles::configure_routes as configure_shapefile_routes;
