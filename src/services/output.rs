//! Output persister: write a buffered dataset as a shapefile set under the
//! media root and bundle it into a zip archive.
//!
//! Layout, keyed by a fresh identifier per call:
//!
//! ```text
//! <media_root>/shapefiles/<uid>/<uid>.{shp,shx,dbf,prj,cpg}
//! <media_root>/shapefiles/<uid>.zip
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use geo::Geometry;
use serde_json::Value;
use shapefile::dbase::{self, FieldName, FieldValue, Record, TableWriterBuilder};
use tracing::{info, warn};
use uuid::Uuid;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{AppError, AppResult};
use crate::models::{AttributeField, AttributeKind, VectorDataset};

/// Directory under the media root that holds persisted outputs.
pub const SHAPEFILES_DIR: &str = "shapefiles";

/// Component extensions bundled into the archive, when present.
pub const COMPONENT_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Width and precision used for numeric `.dbf` columns.
const NUMERIC_WIDTH: u8 = 24;
const NUMERIC_DECIMALS: u8 = 15;

/// Integer columns are written as numeric so null survives.
const INTEGER_WIDTH: u8 = 11;

/// Width used for character columns whose source width is unknown.
const CHARACTER_WIDTH: u8 = 254;

/// Encoding declared in the `.cpg` companion.
const CODE_PAGE: &str = "UTF-8";

/// Files written for one buffer request.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    /// 32 lowercase hex characters.
    pub uid: String,
    pub directory: PathBuf,
    pub archive: PathBuf,
}

/// Append-only store of buffer outputs rooted at the media directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    media_root: PathBuf,
}

impl OutputStore {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// `<media_root>/shapefiles`.
    pub fn shapefiles_root(&self) -> PathBuf {
        self.media_root.join(SHAPEFILES_DIR)
    }

    /// Location of the zip archive for `uid`.
    pub fn archive_path(&self, uid: &str) -> PathBuf {
        self.shapefiles_root().join(format!("{}.zip", uid))
    }

    /// Write `dataset` under a fresh identifier and bundle it.
    pub fn persist(&self, dataset: &VectorDataset) -> AppResult<OutputArtifact> {
        let uid = Uuid::new_v4().simple().to_string();
        let directory = self.shapefiles_root().join(&uid);
        fs::create_dir_all(&directory)?;

        write_shapefile(dataset, &directory.join(format!("{}.shp", uid)))?;

        if let Some(wkt) = dataset.crs.as_ref().and_then(|crs| crs.prj_wkt()) {
            fs::write(directory.join(format!("{}.prj", uid)), wkt)?;
        }
        fs::write(directory.join(format!("{}.cpg", uid)), CODE_PAGE)?;

        let archive = self.archive_path(&uid);
        bundle_components(&directory, &uid, &archive)?;

        info!(
            "Persisted {} features as {} ({})",
            dataset.len(),
            uid,
            archive.display()
        );

        Ok(OutputArtifact {
            uid,
            directory,
            archive,
        })
    }
}

/// Whether `uid` has the shape of an identifier this store generates.
pub fn is_valid_uid(uid: &str) -> bool {
    uid.len() == 32 && uid.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Write polygons and attributes to `shp_path` (plus `.shx` and `.dbf`).
///
/// Features without geometry are left out together with their record.
fn write_shapefile(dataset: &VectorDataset, shp_path: &Path) -> AppResult<()> {
    let mut writer = shapefile::Writer::from_path(shp_path, table_builder(&dataset.fields)?)?;

    for (index, feature) in dataset.features.iter().enumerate() {
        let Some(shape) = polygon_shape(index, feature.geometry.as_ref())? else {
            warn!("Feature {} has no geometry, not written to {}", index, shp_path.display());
            continue;
        };
        let record = record_for(&dataset.fields, &feature.properties);
        writer.write_shape_and_record(&shape, &record)?;
    }

    Ok(())
}

fn table_builder(fields: &[AttributeField]) -> AppResult<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();

    for field in fields {
        let name = FieldName::try_from(field.name.as_str()).map_err(|e| {
            AppError::Processing(format!("Invalid field name '{}': {:?}", field.name, e))
        })?;

        builder = match field.kind {
            AttributeKind::Character => builder.add_character_field(name, field.length.max(1)),
            AttributeKind::Text => builder.add_character_field(name, CHARACTER_WIDTH),
            AttributeKind::Numeric => builder.add_numeric_field(name, NUMERIC_WIDTH, NUMERIC_DECIMALS),
            AttributeKind::Integer => builder.add_numeric_field(name, INTEGER_WIDTH, 0),
            AttributeKind::Logical => builder.add_logical_field(name),
            AttributeKind::Date => builder.add_date_field(name),
        };
    }

    Ok(builder)
}

fn record_for(fields: &[AttributeField], properties: &serde_json::Map<String, Value>) -> Record {
    let mut record = Record::default();
    for field in fields {
        let value = properties.get(&field.name).unwrap_or(&Value::Null);
        record.insert(field.name.clone(), field_value(field.kind, value));
    }
    record
}

/// dBase value for a JSON property of the given column kind.
fn field_value(kind: AttributeKind, value: &Value) -> FieldValue {
    match kind {
        AttributeKind::Character | AttributeKind::Text => FieldValue::Character(match value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }),
        AttributeKind::Numeric | AttributeKind::Integer => FieldValue::Numeric(value.as_f64()),
        AttributeKind::Logical => FieldValue::Logical(value.as_bool()),
        AttributeKind::Date => FieldValue::Date(value.as_str().and_then(parse_date)),
    }
}

/// Parse `YYYY-MM-DD`.
fn parse_date(text: &str) -> Option<dbase::Date> {
    let mut parts = text.splitn(3, '-').map(str::parse::<u32>);
    let year = parts.next()?.ok()?;
    let month = parts.next()?.ok()?;
    let day = parts.next()?.ok()?;

    if year > 9999 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(dbase::Date::new(day, month, year))
}

fn polygon_shape(
    index: usize,
    geometry: Option<&Geometry<f64>>,
) -> AppResult<Option<shapefile::Polygon>> {
    match geometry {
        Some(Geometry::Polygon(polygon)) if !polygon.exterior().0.is_empty() => {
            Ok(Some(shapefile::Polygon::from(polygon.clone())))
        }
        Some(Geometry::MultiPolygon(polygons)) if !polygons.0.is_empty() => {
            Ok(Some(shapefile::Polygon::from(polygons.clone())))
        }
        Some(Geometry::Polygon(_)) | Some(Geometry::MultiPolygon(_)) | None => Ok(None),
        Some(_) => Err(AppError::Processing(format!(
            "Feature {} is not a polygon and cannot be written to a polygon shapefile",
            index
        ))),
    }
}

/// Zip the existing `<uid>.<ext>` components of `directory` into `archive`.
fn bundle_components(directory: &Path, uid: &str, archive: &Path) -> AppResult<()> {
    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for extension in COMPONENT_EXTENSIONS {
        let name = format!("{}.{}", uid, extension);
        let path = directory.join(&name);
        if !path.is_file() {
            continue;
        }

        zip.start_file(name, options)?;
        io::copy(&mut File::open(&path)?, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
