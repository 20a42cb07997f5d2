//! Cumulative along-line distance.

use projection::{default_projected_system, transform_coords};
use serde::{Deserialize, Serialize};
use survey_common::{ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

/// Units of a coordinate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateUnits {
    /// Degrees of longitude/latitude
    Geographic,
    /// Linear units (metres)
    Projected,
}

impl CoordinateUnits {
    pub fn of(system: &ReferenceSystem) -> Self {
        if system.is_geographic() {
            CoordinateUnits::Geographic
        } else {
            CoordinateUnits::Projected
        }
    }
}

/// Cumulative Euclidean distance along an ordered coordinate sequence.
///
/// The first element is 0.0 and the result has the input's length. A NaN
/// coordinate makes every later distance NaN. Degrees are rejected because
/// a Euclidean sum over them is not a length.
pub fn coords_to_distance(coords: &[[f64; 2]], units: CoordinateUnits) -> SurveyResult<Vec<f64>> {
    if units == CoordinateUnits::Geographic {
        return Err(SurveyError::Units(
            "geographic coordinates must be projected before measuring distance".to_string(),
        ));
    }

    let mut total = 0.0;
    let mut distances = Vec::with_capacity(coords.len());
    let mut previous: Option<[f64; 2]> = None;
    for &point in coords {
        if let Some([x0, y0]) = previous {
            total += ((point[0] - x0).powi(2) + (point[1] - y0).powi(2)).sqrt();
        }
        distances.push(total);
        previous = Some(point);
    }
    Ok(distances)
}

/// [`coords_to_distance`] with units taken from the reference system.
pub fn coords_to_distance_in(coords: &[[f64; 2]], system: &ReferenceSystem) -> SurveyResult<Vec<f64>> {
    coords_to_distance(coords, CoordinateUnits::of(system))
}

/// Median spacing between consecutive samples, in metres, rounded to 0.1 m.
///
/// Every `stride`-th point is measured and the median step divided by the
/// stride, which smooths out jitter in densely sampled data. Geographic
/// input is projected into the UTM zone containing its centroid.
pub fn median_sample_spacing(
    coords: &[[f64; 2]],
    system: &ReferenceSystem,
    stride: usize,
) -> SurveyResult<f64> {
    if stride == 0 {
        return Err(SurveyError::InvalidStep(stride));
    }

    let sampled: Vec<[f64; 2]> = coords.iter().step_by(stride).copied().collect();
    let projected_system = default_projected_system(&sampled, system)?;
    let projected = transform_coords(&sampled, system, Some(&projected_system))?;

    let distances = coords_to_distance_in(&projected, &projected_system)?;
    let mut steps: Vec<f64> = distances
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|step| step.is_finite())
        .collect();
    if steps.is_empty() {
        return Err(SurveyError::empty_selection(
            "at least two finite samples are needed for a sample spacing",
        ));
    }

    steps.sort_by(f64::total_cmp);
    let mid = steps.len() / 2;
    let median = if steps.len() % 2 == 0 {
        (steps[mid - 1] + steps[mid]) / 2.0
    } else {
        steps[mid]
    };

    let spacing = (median / stride as f64 * 10.0).round() / 10.0;
    debug!(samples = sampled.len(), stride, spacing, "Computed median sample spacing");
    Ok(spacing)
}
