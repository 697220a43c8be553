//! E2E tests: liveness endpoint.

use actix_web::test;
use serde_json::{Value, json};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_ping_answers_every_method() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    for req in [
        test::TestRequest::get(),
        test::TestRequest::post().set_payload("anything"),
        test::TestRequest::put(),
        test::TestRequest::delete(),
    ] {
        let resp = test::call_service(&app, req.uri("/gis/ping/").to_request()).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

#[actix_rt::test]
async fn test_openapi_document_is_served() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["info"]["title"], "GIS Shapefile Server");
    assert!(body["paths"]["/gis/upload/"].is_object());
}
