//! Request logging middleware: one line when a request starts, one when it
//! completes, with status and duration.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// What is known about a request before it is handled.
struct RequestLine {
    id: String,
    method: String,
    path: String,
}

impl RequestLine {
    fn finished(&self, status: StatusCode, elapsed: Duration) {
        let status_code = status.as_u16();
        let duration_ms = elapsed.as_millis();

        if status.is_client_error() || status.is_server_error() {
            warn!(
                target: "gis::http",
                request_id = %self.id,
                method = %self.method,
                path = %self.path,
                status = %status_code,
                duration_ms = %duration_ms,
                "Request failed"
            );
        } else {
            info!(
                target: "gis::http",
                request_id = %self.id,
                method = %self.method,
                path = %self.path,
                status = %status_code,
                duration_ms = %duration_ms,
                "Request completed"
            );
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let line = RequestLine {
            id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            method: req.method().to_string(),
            path: req.path().to_string(),
        };

        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let content_length = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        info!(
            target: "gis::http",
            request_id = %line.id,
            method = %line.method,
            path = %line.path,
            remote_addr = %remote_addr,
            content_length = %content_length,
            "Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            line.finished(res.status(), start.elapsed());
            Ok(res)
        })
    }
}
