//! Spatial selection of points by bounding box.

use projection::transform_bounds;
use survey_common::{BoundingBox, ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

use crate::dataset::PointDataset;

/// Select the points falling inside `bounds`.
///
/// `bounds_system` defaults to the dataset's native system; foreign bounds
/// are reprojected first. Containment is inclusive on both axes and points
/// with NaN coordinates are never selected.
pub fn get_spatial_mask(
    dataset: &PointDataset,
    bounds: &BoundingBox,
    bounds_system: Option<&ReferenceSystem>,
) -> SurveyResult<Vec<bool>> {
    let native = dataset.reference_system();
    let bounds = match bounds_system {
        Some(system) => transform_bounds(bounds, system, &native)?,
        None => *bounds,
    };

    let mask: Vec<bool> = dataset
        .coordinates()
        .iter()
        .map(|&[x, y]| bounds.contains_point(x, y))
        .collect();

    debug!(
        selected = mask.iter().filter(|m| **m).count(),
        total = mask.len(),
        "Computed spatial mask"
    );
    Ok(mask)
}

/// Element-wise AND of two masks of equal length.
pub fn and_masks(a: &[bool], b: &[bool]) -> SurveyResult<Vec<bool>> {
    if a.len() != b.len() {
        return Err(SurveyError::dimension(format!(
            "mask lengths differ: {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b).map(|(x, y)| *x && *y).collect())
}
