//! Download of persisted buffer archives.

use actix_web::http::header::ContentDisposition;
use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::OutputStore;
use crate::services::output::is_valid_uid;

/// Download the zipped shapefile written by a buffer operation.
#[utoipa::path(
    get,
    path = "/media/shapefiles/{file}",
    tag = "Media",
    params(
        ("file" = String, Path, description = "`<shapefile_uid>.zip`")
    ),
    responses(
        (status = 200, description = "Zip archive of the buffered shapefile (application/zip)"),
        (status = 404, description = "No such archive", body = crate::error::ErrorResponse),
    )
)]
pub async fn download_archive(
    path: web::Path<String>,
    store: web::Data<OutputStore>,
) -> AppResult<HttpResponse> {
    let file = path.into_inner();
    let uid = file
        .strip_suffix(".zip")
        .filter(|uid| is_valid_uid(uid))
        .ok_or_else(|| AppError::NotFound(format!("Archive {}", file)))?;

    let archive = store.archive_path(uid);
    let data = match tokio::fs::read(&archive).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Archive missing: {}", archive.display());
            return Err(AppError::NotFound(format!("Archive {}", file)));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header(ContentDisposition::attachment(file.clone()))
        .body(data))
}

/// Configure media routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/media/shapefiles/{file}").route(web::get().to(download_archive)));
}
