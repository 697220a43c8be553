//! Archive ingestion: unpack an uploaded zip into a request-scoped directory
//! and locate the principal `.shp` file inside it.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{AppError, AppResult};

/// Fallback name when the client sent no usable filename.
const DEFAULT_ARCHIVE_NAME: &str = "upload.zip";

/// Raw upload as received from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedArchive {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedArchive {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Final path component of the client filename, so it cannot escape
    /// the extraction directory.
    fn safe_filename(&self) -> &str {
        Path::new(&self.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ARCHIVE_NAME)
    }
}

/// Files of an extracted archive.
///
/// The backing directory is removed when this value is dropped, on every
/// exit path of the request.
#[derive(Debug)]
pub struct ExtractedLayer {
    dir: TempDir,
}

impl ExtractedLayer {
    /// Write the upload under its original name into a fresh temporary
    /// directory, then extract every entry next to it.
    pub fn extract(archive: &UploadedArchive) -> AppResult<Self> {
        let dir = tempfile::Builder::new().prefix("shapefile-").tempdir()?;

        let zip_path = dir.path().join(archive.safe_filename());
        fs::write(&zip_path, &archive.data)?;

        let mut zip = ZipArchive::new(File::open(&zip_path)?)?;
        zip.extract(dir.path())?;

        debug!(
            "Extracted {} entries from {} into {}",
            zip.len(),
            archive.filename,
            dir.path().display()
        );

        Ok(Self { dir })
    }

    /// Directory holding the extracted files.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Find the principal geometry file of this layer.
    pub fn locate_shapefile(&self) -> AppResult<PathBuf> {
        locate_shapefile(self.path())
    }
}

/// Scan the immediate entries of `dir` for a file ending in `.shp`
/// (case-insensitive). When several match, the lexicographically smallest
/// name wins.
pub fn locate_shapefile(dir: &Path) -> AppResult<PathBuf> {
    let mut candidates = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase().ends_with(".shp") {
            candidates.push(name);
        }
    }

    candidates.sort();

    candidates
        .into_iter()
        .next()
        .map(|name| dir.join(name))
        .ok_or(AppError::MissingShapefile)
}
