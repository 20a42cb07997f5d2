//! Common types shared by the line-survey crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;

pub use bbox::BoundingBox;
pub use crs::{Datum, ReferenceSystem};
pub use error::{SurveyError, SurveyResult};
pub use grid::{GeoTransform, RasterGrid};
