//! Dataset loader: read a `.shp` and its companions into a [`VectorDataset`].

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use dbase::encoding::{LossyCodePage, UnicodeLossy};
use dbase::yore::code_pages::{
    CP437, CP850, CP852, CP861, CP865, CP866, CP874, CP1250, CP1251, CP1252, CP1253, CP1254,
    CP1255, CP1256,
};
use dbase::{FieldType, FieldValue};
use geo::Geometry;
use serde_json::{Map, Number, Value};
use shapefile::{Shape, ShapeReader};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::{AttributeField, AttributeKind, Crs, Feature, VectorDataset};

/// Name dBase readers may report for the record deletion marker.
const DELETION_FLAG: &str = "DeletionFlag";

/// Windows code page number of UTF-8.
const UTF8_CODE_PAGE: u16 = 65001;

/// Load the layer rooted at `shp_path`.
///
/// `.dbf`, `.cpg` and `.prj` are looked up next to the `.shp` with the same
/// stem, ignoring extension case. A missing `.dbf` yields features without
/// attributes; a missing or blank `.prj` yields `crs: None`. Text columns
/// are decoded with the `.cpg` code page, or the table's own code page mark
/// when there is none.
pub fn load_dataset(shp_path: &Path) -> AppResult<VectorDataset> {
    let shapes = ShapeReader::from_path(shp_path)?.read()?;

    let (fields, mut records) = match companion(shp_path, "dbf") {
        Some(dbf_path) => read_attributes(&dbf_path, code_page(shp_path)?)?,
        None => (Vec::new(), Vec::new()),
    };

    let crs = match companion(shp_path, "prj") {
        Some(prj_path) => Crs::from_wkt(&String::from_utf8_lossy(&fs::read(prj_path)?)),
        None => None,
    };

    if !records.is_empty() && records.len() != shapes.len() {
        debug!(
            "Shape count {} differs from record count {}",
            shapes.len(),
            records.len()
        );
    }
    records.resize_with(shapes.len(), Map::new);

    let features = shapes
        .into_iter()
        .zip(records)
        .map(|(shape, properties)| {
            Ok(Feature {
                geometry: shape_geometry(shape)?,
                properties: with_all_fields(&fields, properties),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    info!(
        "Loaded {} features ({} attribute fields, CRS {}) from {}",
        features.len(),
        fields.len(),
        crs.as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "undefined".to_string()),
        shp_path.display()
    );

    Ok(VectorDataset {
        fields,
        features,
        crs,
    })
}

/// Sibling of `shp_path` with the given extension, matched case-insensitively.
fn companion(shp_path: &Path, extension: &str) -> Option<PathBuf> {
    let exact = shp_path.with_extension(extension);
    if exact.is_file() {
        return Some(exact);
    }

    let stem = shp_path.file_stem()?.to_str()?;
    let dir = shp_path.parent()?;
    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path.file_stem().and_then(|s| s.to_str()) == Some(stem)
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
}

/// Code page declared by the `.cpg` companion, if any is recognised.
fn code_page(shp_path: &Path) -> AppResult<Option<u16>> {
    let Some(cpg_path) = companion(shp_path, "cpg") else {
        return Ok(None);
    };

    let label = String::from_utf8_lossy(&fs::read(&cpg_path)?).into_owned();
    let code = code_page_for_label(&label);
    match code {
        Some(code) => debug!("Reading attributes with code page {}", code),
        None => debug!("Unrecognised code page '{}', using the table default", label.trim()),
    }
    Ok(code)
}

/// Map a `.cpg` label (`UTF-8`, `1252`, `CP1252`, `ANSI 1252`,
/// `ISO-8859-1`, `8859_1`, ...) to a Windows/DOS code page number.
/// 65001 stands for UTF-8.
fn code_page_for_label(label: &str) -> Option<u16> {
    let upper = label
        .trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_ascii_uppercase()
        .replace('_', "-");

    match upper.as_str() {
        "UTF-8" | "UTF8" => return Some(UTF8_CODE_PAGE),
        // Latin-1 is decoded as its Windows superset
        "ISO-8859-1" | "8859-1" | "LATIN1" | "LATIN-1" => return Some(1252),
        _ => {}
    }

    let code = upper
        .trim_start_matches("ANSI")
        .trim_start_matches("CP")
        .trim_start_matches("WINDOWS-")
        .trim()
        .parse::<u16>()
        .ok()?;
    matches!(code, 437 | 850 | 852 | 861 | 865 | 866 | 874 | 1250..=1256 | UTF8_CODE_PAGE)
        .then_some(code)
}

/// Set the reader's text decoding to `code`, replacing undecodable bytes.
fn apply_code_page(reader: &mut dbase::Reader<BufReader<File>>, code: u16) {
    match code {
        437 => reader.set_encoding(LossyCodePage(CP437)),
        850 => reader.set_encoding(LossyCodePage(CP850)),
        852 => reader.set_encoding(LossyCodePage(CP852)),
        861 => reader.set_encoding(LossyCodePage(CP861)),
        865 => reader.set_encoding(LossyCodePage(CP865)),
        866 => reader.set_encoding(LossyCodePage(CP866)),
        874 => reader.set_encoding(LossyCodePage(CP874)),
        1250 => reader.set_encoding(LossyCodePage(CP1250)),
        1251 => reader.set_encoding(LossyCodePage(CP1251)),
        1252 => reader.set_encoding(LossyCodePage(CP1252)),
        1253 => reader.set_encoding(LossyCodePage(CP1253)),
        1254 => reader.set_encoding(LossyCodePage(CP1254)),
        1255 => reader.set_encoding(LossyCodePage(CP1255)),
        1256 => reader.set_encoding(LossyCodePage(CP1256)),
        _ => reader.set_encoding(UnicodeLossy),
    }
}

/// Read the attribute schema and every record of a `.dbf` table.
fn read_attributes(
    dbf_path: &Path,
    code_page: Option<u16>,
) -> AppResult<(Vec<AttributeField>, Vec<Map<String, Value>>)> {
    let mut reader = dbase::Reader::from_path(dbf_path)?;
    if let Some(code) = code_page {
        apply_code_page(&mut reader, code);
    }

    let fields: Vec<AttributeField> = reader
        .fields()
        .iter()
        .filter(|info| info.name() != DELETION_FLAG)
        .map(|info| AttributeField {
            name: info.name().to_string(),
            kind: attribute_kind(info.field_type()),
            length: info.length(),
        })
        .collect();

    let records = reader
        .read()?
        .into_iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| {
                    let value = record.get(&field.name).map(json_value).unwrap_or(Value::Null);
                    (field.name.clone(), value)
                })
                .collect()
        })
        .collect();

    Ok((fields, records))
}

/// Fill in `null` for fields a short record does not carry.
fn with_all_fields(fields: &[AttributeField], mut properties: Map<String, Value>) -> Map<String, Value> {
    if properties.len() == fields.len() {
        return properties;
    }
    fields
        .iter()
        .map(|field| {
            let value = properties.remove(&field.name).unwrap_or(Value::Null);
            (field.name.clone(), value)
        })
        .collect()
}

fn attribute_kind(field_type: FieldType) -> AttributeKind {
    match field_type {
        FieldType::Character => AttributeKind::Character,
        FieldType::Numeric | FieldType::Float | FieldType::Double | FieldType::Currency => {
            AttributeKind::Numeric
        }
        FieldType::Integer => AttributeKind::Integer,
        FieldType::Logical => AttributeKind::Logical,
        FieldType::Date => AttributeKind::Date,
        _ => AttributeKind::Text,
    }
}

/// JSON form of a dBase value.
fn json_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Value::Null
            } else {
                Value::from(text)
            }
        }
        FieldValue::Numeric(Some(n)) => number(*n),
        FieldValue::Float(Some(n)) => number(f64::from(*n)),
        FieldValue::Double(n) | FieldValue::Currency(n) => number(*n),
        FieldValue::Integer(n) => Value::from(*n),
        FieldValue::Logical(Some(b)) => Value::Bool(*b),
        FieldValue::Date(Some(date)) => Value::from(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        FieldValue::Memo(text) => Value::from(text.as_str()),
        _ => Value::Null,
    }
}

fn number(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn shape_geometry(shape: Shape) -> AppResult<Option<Geometry<f64>>> {
    match shape {
        Shape::NullShape => Ok(None),
        other => Geometry::<f64>::try_from(other)
            .map(Some)
            .map_err(|e| AppError::Processing(e.to_string())),
    }
}
