//! Vector geometry derived from survey lines.

use geo::{Area, ConcaveHull, Coord, ConvexHull, LineString, MultiLineString, MultiPoint, Point, Polygon, Rect, Simplify};
use projection::{transform_bounds, transform_coords};
use survey_common::{ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

use crate::dataset::PointDataset;
use crate::lines::{line_sample_points, LineIndex};

/// Number of divisions per line used for hull sampling.
const HULL_LINE_DIVISIONS: usize = 10;

/// One line string per survey line, optionally simplified.
///
/// NaN coordinates are dropped and lines left with fewer than two vertices
/// are skipped. `tolerance` is in target units; 0 keeps every vertex.
pub fn multi_line_string(
    dataset: &PointDataset,
    index: &LineIndex,
    to_system: Option<&ReferenceSystem>,
    tolerance: f64,
) -> SurveyResult<MultiLineString<f64>> {
    let native = dataset.reference_system();
    let coords = dataset.coordinates();

    let mut lines = Vec::with_capacity(index.len());
    for (_, range) in index.iter() {
        let vertices: Vec<[f64; 2]> = coords[range]
            .iter()
            .filter(|[x, y]| x.is_finite() && y.is_finite())
            .copied()
            .collect();
        if vertices.len() < 2 {
            continue;
        }

        let vertices = transform_coords(&vertices, &native, to_system)?;
        let line: LineString<f64> = vertices.into_iter().map(|[x, y]| Coord { x, y }).collect();
        lines.push(if tolerance > 0.0 {
            line.simplify(tolerance)
        } else {
            line
        });
    }

    debug!(lines = lines.len(), tolerance, "Built multi line string");
    Ok(MultiLineString::new(lines))
}

/// Convex hull of the line sample points.
///
/// Falls back to the dataset's bounding rectangle when the samples cannot
/// form a polygon (fewer than three distinct points).
pub fn convex_hull(
    dataset: &PointDataset,
    index: &LineIndex,
    to_system: Option<&ReferenceSystem>,
) -> SurveyResult<Polygon<f64>> {
    let native = dataset.reference_system();
    let samples = line_sample_points(dataset, index, HULL_LINE_DIVISIONS)?;
    let samples = transform_coords(&samples, &native, to_system)?;

    let mut distinct = samples.clone();
    distinct.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    distinct.dedup();

    if distinct.len() >= 3 {
        let points: MultiPoint<f64> = samples.iter().map(|&[x, y]| Point::new(x, y)).collect();
        let hull = points.convex_hull();
        // Collinear samples give a degenerate hull with no area
        if hull.unsigned_area() > 0.0 {
            return Ok(hull);
        }
    }

    debug!("Convex hull fell back to bounding rectangle");
    bounding_rectangle(dataset, to_system)
}

/// Concave outline of every line point.
///
/// `concavity` is the ratio of hull edge length to the distance of the
/// nearest inner point above which the edge is pulled inwards; smaller
/// values follow the lines more closely. Falls back to the bounding
/// rectangle like [`convex_hull`].
pub fn concave_hull(
    dataset: &PointDataset,
    index: &LineIndex,
    to_system: Option<&ReferenceSystem>,
    concavity: f64,
) -> SurveyResult<Polygon<f64>> {
    if !(concavity.is_finite() && concavity > 0.0) {
        return Err(SurveyError::InvalidDistance(concavity));
    }

    let native = dataset.reference_system();
    let coords = dataset.coordinates();
    let line_points: Vec<[f64; 2]> = index
        .iter()
        .flat_map(|(_, range)| coords[range].iter())
        .filter(|[x, y]| x.is_finite() && y.is_finite())
        .copied()
        .collect();
    let mut distinct = transform_coords(&line_points, &native, to_system)?;
    distinct.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    distinct.dedup();

    if distinct.len() >= 3 {
        let points: MultiPoint<f64> = distinct.iter().map(|&[x, y]| Point::new(x, y)).collect();
        // Collinear points have no outline to carve
        if points.convex_hull().unsigned_area() > 0.0 {
            let hull = points.concave_hull(concavity);
            debug!(points = distinct.len(), vertices = hull.exterior().0.len(), concavity, "Built concave hull");
            return Ok(hull);
        }
    }

    debug!("Concave hull fell back to bounding rectangle");
    bounding_rectangle(dataset, to_system)
}

/// Native extent of the dataset as a polygon in the target system.
fn bounding_rectangle(dataset: &PointDataset, to_system: Option<&ReferenceSystem>) -> SurveyResult<Polygon<f64>> {
    let native = dataset.reference_system();
    let extent = dataset
        .extent()
        .ok_or_else(|| SurveyError::empty_selection("dataset has no finite coordinates"))?;
    let extent = match to_system {
        Some(target) => transform_bounds(&extent, &native, target)?,
        None => extent,
    };
    Ok(Rect::new(
        Coord {
            x: extent.min_x,
            y: extent.min_y,
        },
        Coord {
            x: extent.max_x,
            y: extent.max_y,
        },
    )
    .to_polygon())
}
