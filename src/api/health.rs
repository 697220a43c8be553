//! Liveness endpoint.

use actix_web::{HttpResponse, web};

use crate::models::PingResponse;

/// Liveness check.
///
/// Answers every method with `{"status":"ok"}`; the body is ignored.
#[utoipa::path(
    get,
    path = "/gis/ping/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = PingResponse)
    )
)]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PingResponse { status: "ok" })
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ping/").to(ping));
}
