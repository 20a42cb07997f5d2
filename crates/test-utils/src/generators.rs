//! Synthetic survey data generators.
//!
//! These generators create predictable, verifiable flight lines that can
//! be used across the test suite.

/// Layout of a synthetic survey: parallel east-west lines.
#[derive(Debug, Clone, Copy)]
pub struct SurveySpec {
    /// Number of flight lines
    pub lines: usize,
    /// Points per line
    pub points_per_line: usize,
    /// First line number; later lines count up by 10
    pub first_line: i64,
    /// Western end of every line
    pub origin_x: f64,
    /// Southern-most line
    pub origin_y: f64,
    /// Distance between consecutive points along a line
    pub point_spacing: f64,
    /// Distance between lines
    pub line_spacing: f64,
}

impl Default for SurveySpec {
    /// Ten 100-point lines with 12.5 m samples and 200 m line spacing,
    /// placed in MGA zone 54 near Adelaide.
    fn default() -> Self {
        Self {
            lines: 10,
            points_per_line: 100,
            first_line: 1000,
            origin_x: 280000.0,
            origin_y: 6130000.0,
            point_spacing: 12.5,
            line_spacing: 200.0,
        }
    }
}

/// Raw arrays of a synthetic survey.
#[derive(Debug, Clone)]
pub struct SyntheticSurvey {
    pub coordinates: Vec<[f64; 2]>,
    pub line_numbers: Vec<Option<i64>>,
    /// Smooth magnetic-like field, nT
    pub mag: Vec<f64>,
    /// Three-channel decay, row-major
    pub em: Vec<f64>,
}

impl SyntheticSurvey {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Field value at a position: a regional gradient plus a bump.
///
/// Deterministic so tests can check gridded values against it.
pub fn magnetic_field(x: f64, y: f64) -> f64 {
    50000.0 + 0.01 * x + 100.0 * ((x / 500.0).sin() * (y / 700.0).cos())
}

/// Creates a survey of parallel lines.
///
/// Lines alternate direction (boustrophedon), as they are flown, so the
/// point order within even lines runs west to east and odd lines east to
/// west.
///
/// # Example
///
/// ```
/// use test_utils::{create_survey_lines, SurveySpec};
///
/// let survey = create_survey_lines(&SurveySpec { lines: 2, points_per_line: 3, ..Default::default() });
/// assert_eq!(survey.len(), 6);
/// assert_eq!(survey.line_numbers[0], Some(1000));
/// assert_eq!(survey.line_numbers[3], Some(1010));
/// ```
pub fn create_survey_lines(spec: &SurveySpec) -> SyntheticSurvey {
    let total = spec.lines * spec.points_per_line;
    let mut coordinates = Vec::with_capacity(total);
    let mut line_numbers = Vec::with_capacity(total);
    let mut mag = Vec::with_capacity(total);
    let mut em = Vec::with_capacity(total * 3);

    for line in 0..spec.lines {
        let y = spec.origin_y + line as f64 * spec.line_spacing;
        for point in 0..spec.points_per_line {
            let along = if line % 2 == 0 {
                point
            } else {
                spec.points_per_line - 1 - point
            };
            let x = spec.origin_x + along as f64 * spec.point_spacing;

            coordinates.push([x, y]);
            line_numbers.push(Some(spec.first_line + 10 * line as i64));
            mag.push(magnetic_field(x, y));
            let base = 1.0 + (x - spec.origin_x) / 1000.0;
            em.extend([base * 100.0, base * 10.0, base]);
        }
    }

    SyntheticSurvey {
        coordinates,
        line_numbers,
        mag,
        em,
    }
}

/// Creates a survey in geographic degrees.
///
/// Same layout as [`create_survey_lines`], but `point_spacing` and
/// `line_spacing` are taken as degrees from (`origin_x`, `origin_y`).
pub fn create_geographic_survey_lines(spec: &SurveySpec) -> SyntheticSurvey {
    let mut survey = create_survey_lines(spec);
    for (point, value) in survey.coordinates.iter().zip(survey.mag.iter_mut()) {
        *value = magnetic_field(point[0] * 100000.0, point[1] * 100000.0);
    }
    survey
}

/// Replaces coordinates at the given indices with NaN.
pub fn with_coordinate_gaps(mut survey: SyntheticSurvey, indices: &[usize]) -> SyntheticSurvey {
    for &i in indices {
        if let Some(point) = survey.coordinates.get_mut(i) {
            *point = [f64::NAN, f64::NAN];
        }
    }
    survey
}

/// Marks points as belonging to no line (e.g. turns between lines).
pub fn with_unassigned_points(mut survey: SyntheticSurvey, indices: &[usize]) -> SyntheticSurvey {
    for &i in indices {
        if let Some(line) = survey.line_numbers.get_mut(i) {
            *line = None;
        }
    }
    survey
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_survey_layout() {
        let survey = create_survey_lines(&SurveySpec::default());
        assert_eq!(survey.len(), 1000);
        assert_eq!(survey.em.len(), 3000);
        assert_eq!(survey.coordinates[0], [280000.0, 6130000.0]);
        // Second line flies back west
        assert_eq!(survey.coordinates[100], [280000.0 + 99.0 * 12.5, 6130200.0]);
        assert_eq!(survey.line_numbers[999], Some(1090));
    }

    #[test]
    fn test_field_is_deterministic() {
        let a = create_survey_lines(&SurveySpec::default());
        let b = create_survey_lines(&SurveySpec::default());
        assert_eq!(a.mag, b.mag);
        assert_eq!(a.mag[0], magnetic_field(280000.0, 6130000.0));
    }

    #[test]
    fn test_gaps_and_unassigned() {
        let spec = SurveySpec {
            lines: 1,
            points_per_line: 5,
            ..Default::default()
        };
        let survey = with_unassigned_points(with_coordinate_gaps(create_survey_lines(&spec), &[1, 99]), &[4]);
        assert!(survey.coordinates[1][0].is_nan());
        assert!(!survey.coordinates[2][0].is_nan());
        assert_eq!(survey.line_numbers[4], None);
    }

    #[test]
    fn test_geographic_survey() {
        let spec = SurveySpec {
            lines: 2,
            points_per_line: 4,
            origin_x: 138.5,
            origin_y: -35.0,
            point_spacing: 0.001,
            line_spacing: 0.01,
            ..Default::default()
        };
        let survey = create_geographic_survey_lines(&spec);
        assert_eq!(survey.coordinates[0], [138.5, -35.0]);
        assert!(survey.mag.iter().all(|v| v.is_finite()));
    }
}
