//! Gridding of scattered survey points onto a regular raster.
//!
//! # Pipeline
//!
//! ```text
//! PointDataset
//!      │
//!      ├─► every point_step-th point
//!      ├─► spatial mask of the request bounds
//!      ├─► drop NaN coordinates
//!      │
//!      ├─► transform into the target system (UTM zone by default)
//!      ├─► raster extent and geotransform
//!      │
//!      └─► one layer per variable (vector attributes: one per column),
//!          gridded in parallel
//!               │
//!               ▼
//!          RasterGrid
//! ```

pub mod binning;
pub mod interpolation;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use survey_common::{
    BoundingBox, GeoTransform, RasterGrid, ReferenceSystem, SurveyError, SurveyResult,
};
use tracing::{debug, info};

use projection::{default_projected_system, transform_bounds, transform_coords};

use crate::dataset::{AttributeValues, PointDataset};
use crate::spatial::get_spatial_mask;

pub use binning::CellAssignment;

/// Largest raster, in cells per layer, that `grid_points` will allocate.
pub const MAX_GRID_CELLS: usize = 100_000_000;

/// How contributing points are combined into a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GriddingMethod {
    /// Value of the point closest to the cell centre
    #[default]
    Nearest,
    /// Mean of the points falling in the cell
    Mean,
    /// Inverse-distance weighting of points within `radius` of the cell
    /// centre. The radius defaults to twice the resolution.
    InverseDistance { radius: Option<f64>, power: f64 },
}

impl GriddingMethod {
    /// Parse a method name (case-insensitive). IDW takes its parameters
    /// from the arguments.
    pub fn from_name(name: &str, idw_radius: Option<f64>, idw_power: f64) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "mean" => Some(Self::Mean),
            "idw" | "inverse_distance" => Some(Self::InverseDistance {
                radius: idw_radius,
                power: idw_power,
            }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Mean => "mean",
            Self::InverseDistance { .. } => "idw",
        }
    }
}

impl std::fmt::Display for GriddingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parameters for [`grid_points`].
#[derive(Debug, Clone)]
pub struct GridRequest {
    /// Cell size in target units
    pub resolution: f64,
    /// Attributes to grid, in layer order
    pub variables: Vec<String>,
    /// Restrict points and raster extent to these bounds
    pub bounds: Option<BoundingBox>,
    /// System of `bounds`, native when `None`
    pub bounds_system: Option<ReferenceSystem>,
    /// Raster system; the UTM zone of the data when `None`
    pub target_system: Option<ReferenceSystem>,
    /// Use every k-th point
    pub point_step: usize,
    pub method: GriddingMethod,
    /// Value of cells without contributing points
    pub no_data: f32,
}

impl GridRequest {
    pub fn new(resolution: f64, variables: Vec<String>) -> Self {
        Self {
            resolution,
            variables,
            bounds: None,
            bounds_system: None,
            target_system: None,
            point_step: 1,
            method: GriddingMethod::Nearest,
            no_data: f32::NAN,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox, system: Option<ReferenceSystem>) -> Self {
        self.bounds = Some(bounds);
        self.bounds_system = system;
        self
    }

    pub fn with_target_system(mut self, system: ReferenceSystem) -> Self {
        self.target_system = Some(system);
        self
    }

    pub fn with_point_step(mut self, point_step: usize) -> Self {
        self.point_step = point_step;
        self
    }

    pub fn with_method(mut self, method: GriddingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_no_data(mut self, no_data: f32) -> Self {
        self.no_data = no_data;
        self
    }

    fn validate(&self, dataset: &PointDataset) -> SurveyResult<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(SurveyError::InvalidResolution(self.resolution));
        }
        if self.point_step == 0 {
            return Err(SurveyError::InvalidStep(self.point_step));
        }
        if self.variables.is_empty() {
            return Err(SurveyError::AttributeNotFound(
                "no variables requested".to_string(),
            ));
        }
        for name in &self.variables {
            dataset.attribute(name)?;
        }
        if let GriddingMethod::InverseDistance { radius, power } = self.method {
            if let Some(radius) = radius {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(SurveyError::InvalidDistance(radius));
                }
            }
            if !(power.is_finite() && power >= 0.0) {
                return Err(SurveyError::Config(format!(
                    "IDW power must be a non-negative number, got {}",
                    power
                )));
            }
        }
        Ok(())
    }
}

/// A single output layer: a name and one value per selected point.
struct LayerSource {
    name: String,
    values: Vec<f64>,
}

/// Grid dataset points onto a north-up raster.
///
/// Cells with no contributing point hold the request's no-data value. Use
/// [`RasterGrid::into_parts`] to split out the reference system and
/// geotransform.
pub fn grid_points(dataset: &PointDataset, request: &GridRequest) -> SurveyResult<RasterGrid> {
    request.validate(dataset)?;
    let native = dataset.reference_system();

    // Point selection
    let bounds_mask = match &request.bounds {
        Some(bounds) => Some(get_spatial_mask(dataset, bounds, request.bounds_system.as_ref())?),
        None => None,
    };
    let coords = dataset.coordinates();
    let selected: Vec<usize> = (0..dataset.len())
        .step_by(request.point_step)
        .filter(|&i| bounds_mask.as_ref().map_or(true, |mask| mask[i]))
        .filter(|&i| coords[i][0].is_finite() && coords[i][1].is_finite())
        .collect();
    if selected.is_empty() {
        return Err(SurveyError::empty_selection(
            "no points with finite coordinates inside the requested bounds",
        ));
    }

    // Target system and extent
    let native_points: Vec<[f64; 2]> = selected.iter().map(|&i| coords[i]).collect();
    let target = match request.target_system {
        Some(system) => system,
        None => default_projected_system(&native_points, &native)?,
    };
    let points = transform_coords(&native_points, &native, Some(&target))?;

    // Selected points may curve outside the reprojected bounds corners
    let points_extent = BoundingBox::envelope(points.iter()).ok_or_else(|| {
        SurveyError::empty_selection("no points with finite coordinates in the target system")
    })?;
    let extent = match &request.bounds {
        Some(bounds) => {
            let bounds_system = request.bounds_system.unwrap_or(native);
            transform_bounds(bounds, &bounds_system, &target)?.union(&points_extent)
        }
        None => points_extent,
    };

    let (width, height) = grid_shape(&extent, request.resolution)?;
    let geotransform = GeoTransform::north_up(extent.min_x, extent.max_y, request.resolution);

    debug!(
        points = points.len(),
        width,
        height,
        target = %target,
        "Prepared grid"
    );

    // Layers
    let layers = layer_sources(dataset, request, &selected)?;
    let cells = CellAssignment::new(&points, &geotransform, width, height);

    let layer_data: Vec<Vec<f32>> = layers
        .par_iter()
        .map(|layer| match request.method {
            GriddingMethod::Nearest => binning::nearest(&cells, &points, &layer.values, request.no_data),
            GriddingMethod::Mean => binning::mean(&cells, &layer.values, request.no_data),
            GriddingMethod::InverseDistance { radius, power } => interpolation::inverse_distance(
                &points,
                &layer.values,
                &geotransform,
                width,
                height,
                radius.unwrap_or(2.0 * request.resolution),
                power,
                request.no_data,
            ),
        })
        .collect();

    let layer_names: Vec<String> = layers.into_iter().map(|l| l.name).collect();
    info!(
        layers = layer_names.len(),
        width,
        height,
        points = points.len(),
        method = %request.method,
        "Gridded points"
    );

    Ok(RasterGrid {
        data: layer_data.concat(),
        width,
        height,
        layer_names,
        no_data: request.no_data,
        reference_system: target,
        geotransform,
    })
}

/// Raster width and height covering `extent` at `resolution`.
fn grid_shape(extent: &BoundingBox, resolution: f64) -> SurveyResult<(usize, usize)> {
    let columns = (extent.width() / resolution).ceil().max(1.0);
    let rows = (extent.height() / resolution).ceil().max(1.0);
    if !(columns.is_finite() && rows.is_finite()) || columns * rows > MAX_GRID_CELLS as f64 {
        return Err(SurveyError::dimension(format!(
            "a {} x {} grid at resolution {} exceeds {} cells",
            columns, rows, resolution, MAX_GRID_CELLS
        )));
    }
    Ok((columns as usize, rows as usize))
}

/// Expand the requested variables into per-layer value vectors.
fn layer_sources(
    dataset: &PointDataset,
    request: &GridRequest,
    selected: &[usize],
) -> SurveyResult<Vec<LayerSource>> {
    let mut layers = Vec::new();
    for name in &request.variables {
        let attribute = dataset.attribute(name)?;
        match attribute {
            AttributeValues::Scalar(values) => layers.push(LayerSource {
                name: name.clone(),
                values: selected.iter().map(|&i| values[i]).collect(),
            }),
            AttributeValues::Vector { width, .. } => {
                for column in 0..*width {
                    layers.push(LayerSource {
                        name: format!("{}[{}]", name, column),
                        values: selected
                            .iter()
                            .map(|&i| attribute.row(i).map_or(f64::NAN, |row| row[column]))
                            .collect(),
                    });
                }
            }
        }
    }
    Ok(layers)
}
