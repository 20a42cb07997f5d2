//! Shared test utilities for the line-survey workspace.
//!
//! - [`generators`]: synthetic flight lines with known values
//! - [`fixtures`]: reference systems, bounds, the two-line scenario and
//!   surveyed control points
//! - [`assertions`]: tolerance checks for distances and coordinates
//! - [`paths`]: locating optional real survey files
//!
//! ```ignore
//! use test_utils::{require_test_file, scenario};
//! ```

pub mod assertions;
pub mod fixtures;
pub mod generators;
pub mod paths;

pub use assertions::*;
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Path of an optional survey file, or return from the test.
///
/// Real survey NetCDF files are large and not checked in. When the file is
/// absent the test reports where it looked and passes without running.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        let Some(path) = $crate::locate_survey_file($name) else {
            return;
        };
        path
    }};
}
