//! Line-survey point processing.
//!
//! Query and gridding engine for airborne geophysical line data:
//!
//! - **Spatial masks**: select points inside a bounding box in any supported
//!   reference system
//! - **Line segmentation**: per-line masks and records over contiguous
//!   line ranges, with optional bounds and distance-based subsampling
//! - **Distance**: cumulative along-line distance and median sample spacing
//! - **Gridding**: nearest-point, mean or inverse-distance rasters of
//!   scattered points, one layer per attribute
//! - **Line geometry**: coordinate repair, line strings and hulls
//!
//! # Example
//!
//! ```ignore
//! use line_processor::{get_lines, grid_points, GridRequest, LineIndex, LineQuery, PointDataset};
//!
//! let dataset = PointDataset::from_source(&source)?;
//! let index = LineIndex::from_dataset(&dataset)?;
//!
//! for record in &get_lines(&dataset, &index, &LineQuery::default())? {
//!     println!("line {}: {} points", record.line_number, record.len());
//! }
//!
//! let grid = grid_points(&dataset, &GridRequest::new(50.0, vec!["mag_awags".into()]))?;
//! let (grid, system, geotransform) = grid.into_parts();
//! ```

pub mod config;
pub mod coordinates;
pub mod dataset;
pub mod distance;
pub mod geometry;
pub mod gridding;
pub mod lines;
pub mod spatial;

pub use config::LineProcessorConfig;
pub use coordinates::{fix_missing_coordinates, CoordinateFlag, RepairedCoordinates};
pub use dataset::{
    Attribute, AttributeSummary, AttributeValues, DatasetSummary, MemoryPointSource, PointDataset,
    PointSource,
};
pub use distance::{coords_to_distance, coords_to_distance_in, median_sample_spacing, CoordinateUnits};
pub use geometry::{concave_hull, convex_hull, multi_line_string};
pub use gridding::{grid_points, GridRequest, GriddingMethod, MAX_GRID_CELLS};
pub use lines::{
    get_line_masks, get_lines, line_sample_points, line_start_end_points, LineIndex,
    LineMaskCursor, LineMaskOptions, LineMasks, LineQuery, LineRecord, LineRecordCursor,
    LineRecords,
};
pub use spatial::{and_masks, get_spatial_mask};
