//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, web};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GIS Shapefile Server",
        version = "0.1.0",
        description = "Upload zipped shapefiles, normalize them to EPSG:4326 and compute planar buffers"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        api::health::ping,
        api::shapefiles::upload_shapefile,
        api::shapefiles::operations_shapefile,
        api::media::download_archive,
    ),
    components(
        schemas(
            error::ErrorResponse,
            models::PingResponse,
            models::BufferResponse,
            api::shapefiles::UploadForm,
            api::shapefiles::BufferForm,
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Shapefiles", description = "Shapefile normalization and buffering"),
        (name = "Media", description = "Persisted buffer outputs"),
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON.
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Configure the OpenAPI route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api-docs/openapi.json").route(web::get().to(openapi_json)));
}
