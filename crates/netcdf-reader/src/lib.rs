//! NetCDF reader for airborne line-survey data.
//!
//! Opens point datasets laid out the way survey line data is distributed
//! (a `point` dimension with coordinates, line membership and per-point
//! channels) and exposes them as a [`line_processor::PointSource`].
//!
//! # Example
//!
//! ```ignore
//! use line_processor::PointDataset;
//! use netcdf_reader::NetCdfLineSource;
//!
//! let source = NetCdfLineSource::open("P1152MAG.nc")?;
//! let dataset = PointDataset::from_source(&source)?;
//! ```

pub mod error;
pub mod native;
pub mod source;

pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
pub use source::{NetCdfLineSource, POINT_DIMENSION};
