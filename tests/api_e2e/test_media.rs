//! E2E tests: download of persisted buffer archives.

use actix_web::test;
use std::io::Cursor;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_buffer_output_is_downloadable() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;
    let archive = shapefile_zip(&MERCATOR_POINTS, true);

    let (status, body) = post_form(
        &app,
        "/operations_shapefile/",
        &[Part::File {
            name: "shapefile",
            filename: "places.zip",
            data: &archive,
        }],
    )
    .await;
    assert_eq!(status, 200);
    let uid = body["shapefile_uid"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/media/shapefiles/{}.zip", uid))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/zip"
    );

    let bytes = test::read_body(resp).await;
    let zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names: Vec<_> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        ["cpg", "dbf", "prj", "shp", "shx"]
            .iter()
            .map(|ext| format!("{}.{}", uid, ext))
            .collect::<Vec<_>>()
    );
}

#[actix_rt::test]
async fn test_unknown_archive_is_not_found() {
    let media = tempfile::tempdir().unwrap();
    let app = create_test_app(media.path()).await;

    let req = test::TestRequest::get()
        .uri("/media/shapefiles/ffffffffffffffffffffffffffffffff.zip")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().ends_with("not found"));
}
