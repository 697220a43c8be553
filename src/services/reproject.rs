//! Reprojection of a whole dataset through PROJ.

use geo::{Coord, MapCoords};
use proj::Proj;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Crs, VectorDataset};

/// Return `dataset` with every geometry transformed into `target`.
///
/// Feature count, order and attributes are unchanged. When the dataset is
/// already in `target` this is a no-op. The dataset must carry a CRS.
pub fn to_crs(dataset: VectorDataset, target: &Crs) -> AppResult<VectorDataset> {
    let source = dataset.crs.clone().ok_or(AppError::UndefinedCrs)?;

    if source.same_as(target) {
        debug!("Dataset already in {}, skipping reprojection", target);
        return Ok(dataset);
    }

    let proj = Proj::new_known_crs(&source.proj_definition(), &target.proj_definition(), None)?;
    debug!("Reprojecting {} features from {} to {}", dataset.len(), source, target);

    let mut reprojected = dataset.try_map_geometries(|geometry| {
        geometry.try_map_coords(|coord: Coord<f64>| {
            proj.convert((coord.x, coord.y))
                .map(|(x, y)| Coord { x, y })
        })
    })?;
    reprojected.crs = Some(target.clone());

    Ok(reprojected)
}
