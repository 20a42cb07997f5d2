//! Repair of missing (NaN) coordinates within survey lines.

use serde::{Deserialize, Serialize};
use survey_common::SurveyResult;
use tracing::debug;

use crate::dataset::PointDataset;
use crate::lines::LineIndex;

/// Provenance of a repaired coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CoordinateFlag {
    Invalid = 0,
    Observed = 1,
    Interpolated = 2,
    Extrapolated = 3,
}

/// Coordinates with gaps filled, plus a flag per point.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedCoordinates {
    pub coordinates: Vec<[f64; 2]>,
    pub flags: Vec<CoordinateFlag>,
}

impl RepairedCoordinates {
    /// Number of points carrying the given flag.
    pub fn count(&self, flag: CoordinateFlag) -> usize {
        self.flags.iter().filter(|f| **f == flag).count()
    }
}

fn is_valid(point: &[f64; 2]) -> bool {
    point[0].is_finite() && point[1].is_finite()
}

/// Interpolate or extrapolate missing coordinates line by line.
///
/// Gaps between two good points are filled linearly. Gaps at the start or
/// end of a line are extrapolated from the step between the two nearest
/// good points, which must be adjacent. Anything else stays `Invalid`. The
/// dataset itself is not modified.
pub fn fix_missing_coordinates(dataset: &PointDataset, index: &LineIndex) -> SurveyResult<RepairedCoordinates> {
    let mut coordinates = dataset.coordinates().to_vec();
    let mut flags: Vec<CoordinateFlag> = coordinates
        .iter()
        .map(|p| {
            if is_valid(p) {
                CoordinateFlag::Observed
            } else {
                CoordinateFlag::Invalid
            }
        })
        .collect();

    for (line, range) in index.iter() {
        let mut i = range.start;
        while i < range.end {
            if flags[i] != CoordinateFlag::Invalid {
                i += 1;
                continue;
            }
            let gap_start = i;
            while i < range.end && flags[i] == CoordinateFlag::Invalid {
                i += 1;
            }
            let gap_end = i;
            let before = (gap_start > range.start).then(|| gap_start - 1);
            let after = (gap_end < range.end).then_some(gap_end);

            fill_gap(&mut coordinates, &mut flags, gap_start..gap_end, before, after, range.clone());
            debug!(line, start = gap_start, count = gap_end - gap_start, "Filled coordinate gap");
        }
    }

    Ok(RepairedCoordinates { coordinates, flags })
}

fn fill_gap(
    coords: &mut [[f64; 2]],
    flags: &mut [CoordinateFlag],
    gap: std::ops::Range<usize>,
    before: Option<usize>,
    after: Option<usize>,
    line: std::ops::Range<usize>,
) {
    let count = gap.len() as f64;
    match (before, after) {
        (Some(b), Some(a)) => {
            let [x0, y0] = coords[b];
            let [x1, y1] = coords[a];
            for (k, i) in gap.enumerate() {
                let w1 = (k + 1) as f64;
                let w0 = count - k as f64;
                coords[i] = [
                    (w0 * x0 + w1 * x1) / (count + 1.0),
                    (w0 * y0 + w1 * y1) / (count + 1.0),
                ];
                flags[i] = CoordinateFlag::Interpolated;
            }
        }
        (None, Some(a)) => {
            if a + 1 >= line.end || flags[a + 1] == CoordinateFlag::Invalid {
                return;
            }
            let [x0, y0] = coords[a];
            let dx = x0 - coords[a + 1][0];
            let dy = y0 - coords[a + 1][1];
            for i in gap {
                let steps = (a - i) as f64;
                coords[i] = [x0 + dx * steps, y0 + dy * steps];
                flags[i] = CoordinateFlag::Extrapolated;
            }
        }
        (Some(b), None) => {
            if b == line.start || flags[b - 1] == CoordinateFlag::Invalid {
                return;
            }
            let [x1, y1] = coords[b];
            let dx = x1 - coords[b - 1][0];
            let dy = y1 - coords[b - 1][1];
            for i in gap {
                let steps = (i - b) as f64;
                coords[i] = [x1 + dx * steps, y1 + dy * steps];
                flags[i] = CoordinateFlag::Extrapolated;
            }
        }
        (None, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryPointSource;
    use survey_common::ReferenceSystem;

    const NAN: [f64; 2] = [f64::NAN, f64::NAN];

    fn repair(coords: Vec<[f64; 2]>) -> RepairedCoordinates {
        let n = coords.len();
        let source = MemoryPointSource::new(coords, vec![Some(7); n], ReferenceSystem::GDA94);
        let dataset = PointDataset::from_source(&source).unwrap();
        let index = LineIndex::from_dataset(&dataset).unwrap();
        fix_missing_coordinates(&dataset, &index).unwrap()
    }

    #[test]
    fn test_interpolates_interior_gap() {
        let repaired = repair(vec![[0.0, 0.0], NAN, NAN, [3.0, 6.0]]);
        assert_eq!(repaired.coordinates[1], [1.0, 2.0]);
        assert_eq!(repaired.coordinates[2], [2.0, 4.0]);
        assert_eq!(repaired.count(CoordinateFlag::Interpolated), 2);
        assert_eq!(repaired.flags[0], CoordinateFlag::Observed);
    }

    #[test]
    fn test_extrapolates_line_ends() {
        let repaired = repair(vec![NAN, NAN, [2.0, 0.0], [3.0, 0.0], NAN]);
        assert_eq!(repaired.coordinates[0], [0.0, 0.0]);
        assert_eq!(repaired.coordinates[1], [1.0, 0.0]);
        assert_eq!(repaired.coordinates[4], [4.0, 0.0]);
        assert_eq!(repaired.count(CoordinateFlag::Extrapolated), 3);
    }

    #[test]
    fn test_single_good_point_stays_invalid() {
        let repaired = repair(vec![NAN, [1.0, 1.0], NAN]);
        assert_eq!(repaired.count(CoordinateFlag::Invalid), 2);
        assert!(repaired.coordinates[0][0].is_nan());
    }
}
