//! Shared test helpers for API E2E tests.

use actix_web::http::StatusCode;
use actix_web::{App, dev::ServiceResponse, test, web};
use gis_shapefile_lib::api;
use gis_shapefile_lib::models::crs::WEB_MERCATOR_ESRI_WKT;
use gis_shapefile_lib::services::OutputStore;
use serde_json::Value;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

/// Route prefix used by the test app.
pub const PREFIX: &str = "/gis";

/// Upload limit used by the test app.
pub const TEST_MAX_UPLOAD_SIZE: usize = 1024 * 1024;

const BOUNDARY: &str = "----gis-e2e-boundary-7MA4YWxkTrZu0gW";

/// Points in EPSG:3857: null island, (10°E, 45°N) and roughly New York.
pub const MERCATOR_POINTS: [(f64, f64); 3] = [
    (0.0, 0.0),
    (1_113_194.9, 5_621_521.5),
    (-8_238_310.2, 4_970_071.6),
];

/// One part of a multipart form.
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// Zip the given `(name, bytes)` entries.
pub fn zip_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
        for (name, data) in entries {
            zip.start_file(name.as_str(), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}

/// Shapefile components of a point layer named `stem`, with a `name`
/// attribute, in EPSG:3857.
pub fn point_layer(stem: &str, points: &[(f64, f64)], with_prj: bool) -> Vec<(String, Vec<u8>)> {
    let dir = tempfile::tempdir().unwrap();
    let shp_path = dir.path().join(format!("{}.shp", stem));
    {
        let table =
            TableWriterBuilder::new().add_character_field(FieldName::try_from("name").unwrap(), 24);
        let mut writer = shapefile::Writer::from_path(&shp_path, table).unwrap();
        for (i, (x, y)) in points.iter().enumerate() {
            let mut record = Record::default();
            record.insert(
                "name".to_string(),
                FieldValue::Character(Some(format!("point-{}", i))),
            );
            writer
                .write_shape_and_record(&shapefile::Point::new(*x, *y), &record)
                .unwrap();
        }
    }
    if with_prj {
        std::fs::write(dir.path().join(format!("{}.prj", stem)), WEB_MERCATOR_ESRI_WKT).unwrap();
    }

    ["shp", "shx", "dbf", "prj"]
        .iter()
        .map(|ext| format!("{}.{}", stem, ext))
        .filter_map(|name| {
            std::fs::read(dir.path().join(&name))
                .ok()
                .map(|data| (name, data))
        })
        .collect()
}

/// Header-only point `.shp`/`.shx` pair: a valid layer with no records.
pub fn empty_point_layer(stem: &str) -> Vec<(String, Vec<u8>)> {
    let mut header = vec![0u8; 100];
    header[0..4].copy_from_slice(&9994i32.to_be_bytes());
    header[24..28].copy_from_slice(&50i32.to_be_bytes());
    header[28..32].copy_from_slice(&1000i32.to_le_bytes());
    header[32..36].copy_from_slice(&1i32.to_le_bytes());

    vec![
        (format!("{}.shp", stem), header.clone()),
        (format!("{}.shx", stem), header),
        (
            format!("{}.prj", stem),
            WEB_MERCATOR_ESRI_WKT.as_bytes().to_vec(),
        ),
    ]
}

/// Zipped point layer, the usual fixture.
pub fn shapefile_zip(points: &[(f64, f64)], with_prj: bool) -> Vec<u8> {
    zip_entries(&point_layer("places", points, with_prj))
}

/// Encode `parts` as `multipart/form-data`; returns the content type and body.
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/zip\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// Create a test app whose outputs land under `media_root`.
pub async fn create_test_app(
    media_root: &Path,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(OutputStore::new(media_root)))
            .app_data(web::Data::new(TEST_MAX_UPLOAD_SIZE))
            .configure(api::configure_media_routes)
            .configure(api::configure_openapi_routes)
            .service(
                web::scope(PREFIX)
                    .configure(api::configure_health_routes)
                    .configure(api::configure_shapefile_routes),
            ),
    )
    .await
}

/// POST a multipart form and return status and raw body.
pub async fn post_form_raw<S>(app: &S, path: &str, parts: &[Part<'_>]) -> (StatusCode, Vec<u8>)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (content_type, body) = multipart_body(parts);
    let req = test::TestRequest::post()
        .uri(&format!("{}{}", PREFIX, path))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status();
    (status, test::read_body(resp).await.to_vec())
}

/// POST a multipart form and return status and JSON body.
pub async fn post_form<S>(app: &S, path: &str, parts: &[Part<'_>]) -> (StatusCode, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = post_form_raw(app, path, parts).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("Response is not JSON ({}): {:?}", e, String::from_utf8_lossy(&body)));
    (status, json)
}

/// Every `[lon, lat]` position in a GeoJSON geometry value.
pub fn positions(geometry: &Value) -> Vec<(f64, f64)> {
    fn walk(value: &Value, out: &mut Vec<(f64, f64)>) {
        if let Some(items) = value.as_array() {
            if items.len() >= 2 && items.iter().all(Value::is_number) {
                out.push((items[0].as_f64().unwrap(), items[1].as_f64().unwrap()));
            } else {
                for item in items {
                    walk(item, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(&geometry["coordinates"], &mut out);
    out
}

/// Assert every position lies in EPSG:4326 ranges.
pub fn assert_geographic(feature_collection: &Value) {
    for feature in feature_collection["features"].as_array().unwrap() {
        for (lon, lat) in positions(&feature["geometry"]) {
            assert!((-180.0..=180.0).contains(&lon), "longitude {}", lon);
            assert!((-90.0..=90.0).contains(&lat), "latitude {}", lat);
        }
    }
}
