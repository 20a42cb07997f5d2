//! Common test fixtures for line-survey tests.
//!
//! Fixtures are plain arrays so any crate can build its own dataset type
//! from them without a dependency cycle.

/// Common bounding boxes as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// Around Adelaide, South Australia, in GDA94 degrees
    pub const ADELAIDE: (f64, f64, f64, f64) = (138.4, -35.1, 138.8, -34.7);

    /// Mainland Australia in GDA94 degrees
    pub const AUSTRALIA: (f64, f64, f64, f64) = (112.0, -44.0, 154.0, -10.0);

    /// Around Brisbane, disjoint from the Adelaide surveys
    pub const BRISBANE: (f64, f64, f64, f64) = (152.9, -27.6, 153.2, -27.3);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// EPSG codes used across the tests.
pub mod epsg {
    pub const GDA94: u32 = 4283;
    pub const GDA2020: u32 = 7844;
    pub const WGS84: u32 = 4326;
    pub const MGA54: u32 = 28354;
    pub const MGA55: u32 = 28355;
    pub const WEB_MERCATOR: u32 = 3857;
}

/// The small two-line dataset used by the worked examples.
///
/// Line 1 runs east along y = 0 and line 2 along y = 5, in projected
/// metres (MGA zone 54).
pub mod scenario {
    /// Native EPSG code of the scenario
    pub const EPSG: u32 = super::epsg::MGA54;

    pub const LINE_NUMBERS: [i64; 5] = [1, 1, 1, 2, 2];

    pub const COORDINATES: [[f64; 2]; 5] = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 5.0], [1.0, 5.0]];

    /// A scalar attribute, increasing along the point sequence
    pub const MAG: [f64; 5] = [10.0, 11.0, 12.0, 20.0, 21.0];

    /// A two-channel attribute, row-major
    pub const EM: [f64; 10] = [1.0, 0.1, 2.0, 0.2, 3.0, 0.3, 4.0, 0.4, 5.0, 0.5];

    /// Line membership in the `Option` form the index builder takes
    pub fn line_membership() -> Vec<Option<i64>> {
        LINE_NUMBERS.iter().copied().map(Some).collect()
    }
}

/// Known projected positions for checking the transverse Mercator code.
pub mod control_points {
    /// Flinders Peak, GDA94: (lon, lat, MGA zone, easting, northing)
    pub const FLINDERS_PEAK: (f64, f64, u8, f64, f64) =
        (144.424867889, -37.951033417, 55, 273741.297, 5796489.777);
}
