//! Shapefile upload and buffer endpoints.

use actix_multipart::Multipart;
use actix_web::http::Method;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::services::{
    OutputStore, UploadedArchive, buffer_operation, parse_buffer_distance, upload_and_normalize,
};

/// Multipart field carrying the zipped shapefile.
const SHAPEFILE_FIELD: &str = "shapefile";

/// Multipart field carrying the optional buffer distance.
const BUFFER_DISTANCE_FIELD: &str = "buffer_distance";

/// Upper bound for plain text fields.
const MAX_TEXT_FIELD_SIZE: usize = 1024;

/// Form accepted by `/upload/` (documentation only).
#[derive(Serialize, ToSchema)]
pub struct UploadForm {
    /// Zip archive holding a `.shp` and its companions.
    #[schema(value_type = String, format = Binary)]
    pub shapefile: Vec<u8>,
}

/// Form accepted by `/operations_shapefile/` (documentation only).
#[derive(Serialize, ToSchema)]
pub struct BufferForm {
    /// Zip archive holding a `.shp` and its companions.
    #[schema(value_type = String, format = Binary)]
    pub shapefile: Vec<u8>,
    /// Buffer distance in meters; defaults to 100.
    #[schema(example = "100")]
    pub buffer_distance: Option<String>,
}

/// Fields collected from a multipart body.
#[derive(Debug, Default)]
struct ShapefileForm {
    archive: Option<UploadedArchive>,
    buffer_distance: Option<String>,
}

/// Read the multipart body of a POST request.
///
/// Any other method, a body that is not multipart, or a malformed body is
/// an `InvalidRequest`. Unknown fields are drained and ignored.
async fn read_form(
    req: &HttpRequest,
    payload: web::Payload,
    max_upload_size: usize,
) -> AppResult<ShapefileForm> {
    if req.method() != Method::POST {
        return Err(AppError::InvalidRequest);
    }

    let mut multipart = Multipart::new(req.headers(), payload);
    let mut form = ShapefileForm::default();

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| {
            debug!("Multipart error: {}", e);
            AppError::InvalidRequest
        })?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename()
                    .filter(|f| !f.is_empty())
                    .map(str::to_string),
            ),
            None => (None, None),
        };

        match (name.as_deref(), filename) {
            (Some(SHAPEFILE_FIELD), Some(filename)) => {
                let data = read_field(&mut field, max_upload_size).await?;
                debug!("Received {} ({} bytes)", filename, data.len());
                form.archive = Some(UploadedArchive::new(filename, data));
            }
            (Some(BUFFER_DISTANCE_FIELD), None) => {
                let data = read_field(&mut field, MAX_TEXT_FIELD_SIZE).await?;
                form.buffer_distance = Some(String::from_utf8_lossy(&data).into_owned());
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|_| AppError::InvalidRequest)?;
                }
            }
        }
    }

    Ok(form)
}

/// Collect one field, refusing to buffer more than `limit` bytes.
async fn read_field(field: &mut actix_multipart::Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| {
            debug!("Read error: {}", e);
            AppError::InvalidRequest
        })?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(limit));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Upload a zipped shapefile and get it back as GeoJSON in EPSG:4326.
#[utoipa::path(
    post,
    path = "/gis/upload/",
    tag = "Shapefiles",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "GeoJSON FeatureCollection in EPSG:4326"),
        (status = 400, description = "Invalid request, no .shp, empty layer or undefined CRS", body = crate::error::ErrorResponse),
        (status = 413, description = "Archive too large", body = crate::error::ErrorResponse),
        (status = 500, description = "Processing failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn upload_shapefile(
    req: HttpRequest,
    payload: web::Payload,
    max_upload_size: web::Data<usize>,
) -> AppResult<HttpResponse> {
    let form = read_form(&req, payload, **max_upload_size).await?;
    let archive = form.archive.ok_or(AppError::InvalidRequest)?;

    info!("Normalizing {} ({} bytes)", archive.filename, archive.data.len());
    let collection = tokio::task::spawn_blocking(move || upload_and_normalize(archive)).await??;

    Ok(HttpResponse::Ok().json(collection))
}

/// Buffer every feature of a zipped shapefile.
///
/// The result is persisted as a zipped shapefile, downloadable from
/// `/media/shapefiles/{shapefile_uid}.zip`.
#[utoipa::path(
    post,
    path = "/gis/operations_shapefile/",
    tag = "Shapefiles",
    request_body(content = BufferForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Buffered features and output identifier", body = crate::models::BufferResponse),
        (status = 400, description = "Invalid request, no .shp or undefined CRS", body = crate::error::ErrorResponse),
        (status = 413, description = "Archive too large", body = crate::error::ErrorResponse),
        (status = 500, description = "Processing failure, including a malformed buffer_distance", body = crate::error::ErrorResponse),
    )
)]
pub async fn operations_shapefile(
    req: HttpRequest,
    payload: web::Payload,
    max_upload_size: web::Data<usize>,
    store: web::Data<OutputStore>,
) -> AppResult<HttpResponse> {
    let form = read_form(&req, payload, **max_upload_size).await?;
    let archive = form.archive.ok_or(AppError::InvalidRequest)?;
    let distance = parse_buffer_distance(form.buffer_distance.as_deref())?;

    info!(
        "Buffering {} ({} bytes) by {}",
        archive.filename,
        archive.data.len(),
        distance
    );
    let store = store.into_inner();
    let response =
        tokio::task::spawn_blocking(move || buffer_operation(archive, distance, &store)).await??;

    Ok(HttpResponse::Ok().json(response))
}

/// Configure shapefile routes.
///
/// Resources take every method so the handlers can answer a wrong method
/// with the JSON `detail` body.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload/").to(upload_shapefile))
        .service(web::resource("/operations_shapefile/").to(operations_shapefile));
}
