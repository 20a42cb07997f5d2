//! Grid and summary output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use survey_common::RasterGrid;

/// NODATA value written when the grid's sentinel is NaN.
pub const ESRI_NODATA: f32 = -9999.0;

/// Write one layer as an ESRI ASCII grid.
///
/// Rows are written top first, as stored. The lower-left corner is taken
/// from the raster extent.
pub fn write_esri_ascii<W: Write>(out: &mut W, grid: &RasterGrid, layer: usize) -> io::Result<()> {
    let values = grid.layer(layer).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("layer {} out of range ({} layers)", layer, grid.layers()),
        )
    })?;
    let nodata = if grid.no_data.is_nan() {
        ESRI_NODATA
    } else {
        grid.no_data
    };
    let extent = grid.extent();

    writeln!(out, "ncols {}", grid.width)?;
    writeln!(out, "nrows {}", grid.height)?;
    writeln!(out, "xllcorner {}", extent.min_x)?;
    writeln!(out, "yllcorner {}", extent.min_y)?;
    writeln!(out, "cellsize {}", grid.geotransform.pixel_width)?;
    writeln!(out, "NODATA_value {}", nodata)?;

    for row in values.chunks(grid.width.max(1)) {
        let line: Vec<String> = row
            .iter()
            .map(|&v| {
                let v = if grid.is_no_data(v) { nodata } else { v };
                v.to_string()
            })
            .collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

/// File name for a layer: `mag.asc` for a single layer, `mag_em_0.asc` style
/// suffixes otherwise.
pub fn layer_path(output: &Path, layer_name: &str, layer_count: usize) -> PathBuf {
    if layer_count <= 1 {
        return output.with_extension("asc");
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grid".to_string());
    let suffix: String = layer_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let suffix = suffix.trim_end_matches('_');
    output.with_file_name(format!("{}_{}.asc", stem, suffix))
}

/// Write every layer, each with a `.prj` sidecar. Returns the grid files.
pub fn write_layers(grid: &RasterGrid, output: &Path) -> io::Result<Vec<PathBuf>> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let wkt = grid.reference_system.to_wkt();
    let mut written = Vec::with_capacity(grid.layers());
    for (index, name) in grid.layer_names.iter().enumerate() {
        let path = layer_path(output, name, grid.layers());
        let mut out = BufWriter::new(File::create(&path)?);
        write_esri_ascii(&mut out, grid, index)?;
        out.flush()?;
        std::fs::write(path.with_extension("prj"), &wkt)?;
        written.push(path);
    }
    Ok(written)
}

/// JSON report of a gridding run.
#[derive(Debug, Clone, Serialize)]
pub struct GridSummary {
    pub width: usize,
    pub height: usize,
    pub reference_system: String,
    /// GDAL-order affine coefficients
    pub geotransform: [f64; 6],
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub valid_cells: usize,
    pub file: Option<PathBuf>,
}

impl GridSummary {
    pub fn new(grid: &RasterGrid, files: &[PathBuf]) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            reference_system: grid.reference_system.to_string(),
            geotransform: grid.geotransform.to_gdal(),
            layers: grid
                .layer_names
                .iter()
                .enumerate()
                .map(|(i, name)| LayerSummary {
                    name: name.clone(),
                    valid_cells: grid.valid_cells(i),
                    file: files.get(i).cloned(),
                })
                .collect(),
        }
    }
}

/// Write a value to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
