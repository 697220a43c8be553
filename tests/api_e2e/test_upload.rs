//! E2E tests: upload-and-normalize endpoint.

use actix_web::test;
use serde_json::Value;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_upload_returns_geographic_feature_collection() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = shapefile_zip(&MERCATOR_POINTS, true);

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::File {
            name: "shapefile",
            filename: "places.zip",
            data: &archive,
        }],
    )
    .await;

    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), MERCATOR_POINTS.len());
    assert_geographic(&body);

    let (lon, lat) = positions(&features[1]["geometry"])[0];
    assert!((lon - 10.0).abs() < 1e-4, "lon = {}", lon);
    assert!((lat - 45.0).abs() < 1e-4, "lat = {}", lat);
    assert_eq!(features[2]["properties"]["name"], "point-2");
}

#[actix_rt::test]
async fn test_upload_is_deterministic() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = shapefile_zip(&MERCATOR_POINTS, true);
    let parts = [Part::File {
        name: "shapefile",
        filename: "places.zip",
        data: &archive,
    }];

    let (first_status, first) = post_form_raw(&app, "/upload/", &parts).await;
    let (second_status, second) = post_form_raw(&app, "/upload/", &parts).await;

    assert_eq!(first_status, 200);
    assert_eq!(second_status, 200);
    assert_eq!(first, second);
}

#[actix_rt::test]
async fn test_upload_without_prj_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = shapefile_zip(&MERCATOR_POINTS, false);

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::File {
            name: "shapefile",
            filename: "places.zip",
            data: &archive,
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "The shapefile has no CRS defined (.prj missing)");
}

#[actix_rt::test]
async fn test_upload_without_shp_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = zip_entries(&[("notes.txt".to_string(), b"no geometry here".to_vec())]);

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::File {
            name: "shapefile",
            filename: "notes.zip",
            data: &archive,
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "No .shp found in the ZIP");
}

#[actix_rt::test]
async fn test_upload_of_empty_layer_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = zip_entries(&empty_point_layer("nothing"));

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::File {
            name: "shapefile",
            filename: "places.zip",
            data: &archive,
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "The shapefile is empty");
}

#[actix_rt::test]
async fn test_upload_without_file_field_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::Text {
            name: "shapefile",
            value: "not a file",
        }],
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["detail"], "Method not allowed or file not sent");
}

#[actix_rt::test]
async fn test_upload_with_get_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    let req = test::TestRequest::get().uri("/gis/upload/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Method not allowed or file not sent");
}

#[actix_rt::test]
async fn test_upload_of_corrupt_zip_is_server_error() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    let (status, body) = post_form(
        &app,
        "/upload/",
        &[Part::File {
            name: "shapefile",
            filename: "broken.zip",
            data: b"this is not a zip archive",
        }],
    )
    .await;

    assert_eq!(status, 500);
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
}
