//! Subcommand implementations.
//!
//! Each command takes an already loaded [`PointDataset`], so the logic is
//! independent of where the points came from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use line_processor::{
    coords_to_distance_in, get_lines, grid_points, median_sample_spacing, DatasetSummary,
    GridRequest, GriddingMethod, LineIndex, LineQuery, PointDataset,
};
use netcdf_reader::NetCdfLineSource;
use projection::{default_projected_system, transform_coords};
use serde::Serialize;
use survey_common::{BoundingBox, ReferenceSystem, SurveyResult};
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::output::{write_layers, GridSummary};

/// Open a NetCDF line file and load it into memory.
pub fn load_dataset(path: &Path) -> Result<PointDataset> {
    let source = NetCdfLineSource::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let dataset = PointDataset::from_source(&source)
        .with_context(|| format!("Failed to load points from {:?}", path))?;
    Ok(dataset)
}

// ============================================================================
// info
// ============================================================================

/// `info` report: the dataset summary plus the median sample spacing.
#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    #[serde(flatten)]
    pub summary: DatasetSummary,
    /// Median distance between samples in metres, when it can be measured
    pub median_spacing_m: Option<f64>,
}

pub fn info(dataset: &PointDataset, config: &CliConfig) -> InfoReport {
    let spacing = median_sample_spacing(
        dataset.coordinates(),
        &dataset.reference_system(),
        config.processing.median_spacing_stride,
    );
    let median_spacing_m = match spacing {
        Ok(spacing) => Some(spacing),
        Err(e) => {
            warn!(error = %e, "Could not compute median sample spacing");
            None
        }
    };

    InfoReport {
        summary: dataset.summary(),
        median_spacing_m,
    }
}

// ============================================================================
// lines
// ============================================================================

/// Options of the `lines` command.
#[derive(Debug, Clone, Default)]
pub struct LinesOptions {
    /// Lines to report; empty means all
    pub lines: Vec<i64>,
    /// Attributes to include; empty means all
    pub variables: Vec<String>,
    pub bounds: Option<BoundingBox>,
    pub bounds_system: Option<ReferenceSystem>,
    pub subsample: Option<f64>,
    /// Measure the along-line length of each returned line
    pub distance: bool,
}

/// One row of the `lines` report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub line: i64,
    pub points: usize,
    pub first_index: Option<usize>,
    pub last_index: Option<usize>,
    /// Along-line length in metres, in the line's UTM zone when geographic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    pub variables: Vec<String>,
}

pub fn lines(dataset: &PointDataset, options: &LinesOptions) -> Result<Vec<LineSummary>> {
    let index = LineIndex::from_dataset(dataset)?;
    let query = LineQuery {
        line_numbers: (!options.lines.is_empty()).then(|| options.lines.clone()),
        variables: (!options.variables.is_empty()).then(|| options.variables.clone()),
        bounds: options.bounds,
        bounds_system: options.bounds_system,
        subsampling_distance: options.subsample,
        contiguous: false,
    };

    let records = get_lines(dataset, &index, &query)?;
    let mut summaries = Vec::with_capacity(records.len());
    for record in &records {
        let length_m = if options.distance {
            Some(line_length(&record.coordinates, &dataset.reference_system())?)
        } else {
            None
        };
        summaries.push(LineSummary {
            line: record.line_number,
            points: record.len(),
            first_index: record.indices.first().copied(),
            last_index: record.indices.last().copied(),
            length_m,
            variables: record.attributes.iter().map(|a| a.name.clone()).collect(),
        });
    }

    info!(lines = summaries.len(), "Retrieved lines");
    Ok(summaries)
}

/// Length of a line, projecting geographic coordinates first.
pub fn line_length(coords: &[[f64; 2]], system: &ReferenceSystem) -> SurveyResult<f64> {
    let finite: Vec<[f64; 2]> = coords
        .iter()
        .filter(|[x, y]| x.is_finite() && y.is_finite())
        .copied()
        .collect();
    if finite.len() < 2 {
        return Ok(0.0);
    }
    let projected_system = default_projected_system(&finite, system)?;
    let projected = transform_coords(&finite, system, Some(&projected_system))?;
    let distances = coords_to_distance_in(&projected, &projected_system)?;
    Ok(distances.last().copied().unwrap_or(0.0))
}

// ============================================================================
// grid
// ============================================================================

/// Options of the `grid` command. Unset values fall back to the configuration.
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub resolution: f64,
    pub variables: Vec<String>,
    pub bounds: Option<BoundingBox>,
    pub bounds_system: Option<ReferenceSystem>,
    pub target_system: Option<ReferenceSystem>,
    pub point_step: Option<usize>,
    pub method: Option<String>,
    pub output: PathBuf,
}

/// Build the gridding request from the options layered over the configuration.
pub fn grid_request(options: &GridOptions, config: &CliConfig) -> Result<GridRequest> {
    let processing = &config.processing;
    let method = match &options.method {
        Some(name) => {
            let (radius, power) = match processing.method {
                GriddingMethod::InverseDistance { radius, power } => (radius, power),
                _ => (None, 2.0),
            };
            GriddingMethod::from_name(name, radius, power)
                .with_context(|| format!("Unknown gridding method '{}'", name))?
        }
        None => processing.method,
    };

    let mut request = GridRequest::new(options.resolution, options.variables.clone())
        .with_point_step(options.point_step.unwrap_or(processing.point_step))
        .with_method(method)
        .with_no_data(processing.no_data);
    if let Some(bounds) = options.bounds {
        request = request.with_bounds(bounds, options.bounds_system);
    }
    if let Some(target) = options.target_system {
        request = request.with_target_system(target);
    }
    Ok(request)
}

/// Grid the dataset and write one ESRI ASCII file per layer.
pub fn grid(dataset: &PointDataset, options: &GridOptions, config: &CliConfig) -> Result<GridSummary> {
    let request = grid_request(options, config)?;
    let grid = grid_points(dataset, &request)?;

    let output = config.output_path(&options.output);
    let files = write_layers(&grid, &output).with_context(|| format!("Failed to write {:?}", output))?;
    info!(files = files.len(), output = %output.display(), "Wrote grid layers");

    Ok(GridSummary::new(&grid, &files))
}
