//! Tolerance assertions for survey values.
//!
//! Functions rather than macros so failures report the caller's line
//! through `#[track_caller]`.

/// Assert that two values differ by at most `tolerance`.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{} is not within {} of {} (off by {})",
        actual,
        tolerance,
        expected,
        diff
    );
}

/// Assert that two `[x, y]` coordinates match on both axes.
#[track_caller]
pub fn assert_point_close(actual: [f64; 2], expected: [f64; 2], tolerance: f64) {
    let dx = (actual[0] - expected[0]).abs();
    let dy = (actual[1] - expected[1]).abs();
    assert!(
        dx <= tolerance && dy <= tolerance,
        "point {:?} is not within {} of {:?} (off by {}, {})",
        actual,
        tolerance,
        expected,
        dx,
        dy
    );
}

/// Assert that a cumulative distance series steps by `spacing` at every point.
#[track_caller]
pub fn assert_uniform_spacing(distances: &[f64], spacing: f64, tolerance: f64) {
    for (i, pair) in distances.windows(2).enumerate() {
        let step = pair[1] - pair[0];
        assert!(
            (step - spacing).abs() <= tolerance,
            "step {} -> {} is {}, expected {}",
            i,
            i + 1,
            step,
            spacing
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_values() {
        assert_close(12.5001, 12.5, 0.001);
        assert_close(-34.9, -34.900001, 0.0001);
        assert_point_close([273741.3, 5796489.8], [273741.297, 5796489.777], 0.1);
        assert_uniform_spacing(&[0.0, 12.5, 25.0, 37.5], 12.5, 1e-9);
        assert_uniform_spacing(&[0.0], 12.5, 1e-9);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_far_values_fail() {
        assert_close(5796490.0, 5796489.777, 0.1);
    }

    #[test]
    #[should_panic(expected = "point")]
    fn test_far_point_fails() {
        assert_point_close([138.6, -34.9], [138.6, -34.8], 0.01);
    }

    #[test]
    #[should_panic(expected = "step 1 -> 2")]
    fn test_uneven_spacing_fails() {
        assert_uniform_spacing(&[0.0, 12.5, 30.0], 12.5, 0.1);
    }
}
