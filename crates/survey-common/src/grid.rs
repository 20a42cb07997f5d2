//! Raster grids produced from scattered point data.

use crate::{BoundingBox, ReferenceSystem};
use serde::{Deserialize, Serialize};

/// Affine mapping from raster (column, row) to world coordinates.
///
/// Coefficients follow the GDAL ordering:
/// `x = origin_x + col * pixel_width + row * row_rotation`,
/// `y = origin_y + col * col_rotation + row * pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform anchored at the top-left corner.
    pub fn north_up(min_x: f64, max_y: f64, resolution: f64) -> Self {
        Self {
            origin_x: min_x,
            pixel_width: resolution,
            row_rotation: 0.0,
            origin_y: max_y,
            col_rotation: 0.0,
            pixel_height: -resolution,
        }
    }

    /// The six coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// World coordinates of a fractional pixel position.
    ///
    /// `(0.0, 0.0)` is the top-left corner of the first cell and
    /// `(0.5, 0.5)` its centre.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Fractional pixel position of a world coordinate.
    ///
    /// Returns `None` for a singular transform.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det == 0.0 {
            return None;
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        Some((col, row))
    }
}

/// A stack of raster layers sharing one geotransform.
///
/// Values are stored layer-major, then row-major with the top row first.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// One name per layer, in the requested variable order
    pub layer_names: Vec<String>,
    /// Value written to cells without contributing points
    pub no_data: f32,
    pub reference_system: ReferenceSystem,
    pub geotransform: GeoTransform,
}

impl RasterGrid {
    /// Number of layers.
    pub fn layers(&self) -> usize {
        self.layer_names.len()
    }

    /// Number of cells in a single layer.
    pub fn cells_per_layer(&self) -> usize {
        self.width * self.height
    }

    /// Values of one layer.
    pub fn layer(&self, index: usize) -> Option<&[f32]> {
        let size = self.cells_per_layer();
        self.data.get(index * size..(index + 1) * size)
    }

    /// Values of a layer by name.
    pub fn layer_by_name(&self, name: &str) -> Option<&[f32]> {
        let index = self.layer_names.iter().position(|n| n == name)?;
        self.layer(index)
    }

    /// Value at a cell.
    pub fn get(&self, layer: usize, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.layer(layer)?.get(row * self.width + col).copied()
    }

    /// Whether a value is the no-data sentinel.
    pub fn is_no_data(&self, value: f32) -> bool {
        if self.no_data.is_nan() {
            value.is_nan()
        } else {
            value == self.no_data
        }
    }

    /// Count of cells holding data in a layer.
    pub fn valid_cells(&self, layer: usize) -> usize {
        self.layer(layer)
            .map(|values| values.iter().filter(|v| !self.is_no_data(**v)).count())
            .unwrap_or(0)
    }

    /// World extent covered by the raster.
    pub fn extent(&self) -> BoundingBox {
        let (x0, y0) = self.geotransform.pixel_to_world(0.0, 0.0);
        let (x1, y1) = self
            .geotransform
            .pixel_to_world(self.width as f64, self.height as f64);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Split into the raster, its reference system and its geotransform.
    pub fn into_parts(self) -> (RasterGrid, ReferenceSystem, GeoTransform) {
        let reference_system = self.reference_system;
        let geotransform = self.geotransform;
        (self, reference_system, geotransform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_world_roundtrip() {
        let gt = GeoTransform::north_up(500000.0, 6100000.0, 25.0);
        let (x, y) = gt.pixel_to_world(0.5, 0.5);
        assert_eq!(x, 500012.5);
        assert_eq!(y, 6099987.5);

        let (col, row) = gt.world_to_pixel(x, y).unwrap();
        assert!((col - 0.5).abs() < 1e-9);
        assert!((row - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_layer_access() {
        let grid = RasterGrid {
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, f32::NAN, 8.0],
            width: 2,
            height: 2,
            layer_names: vec!["a".into(), "b".into()],
            no_data: f32::NAN,
            reference_system: ReferenceSystem::WGS84,
            geotransform: GeoTransform::north_up(0.0, 2.0, 1.0),
        };

        assert_eq!(grid.layers(), 2);
        let b = grid.layer_by_name("b").unwrap();
        assert_eq!(b.len(), 4);
        assert_eq!(b[0], 5.0);
        assert!(b[2].is_nan());
        assert_eq!(grid.get(0, 1, 1), Some(4.0));
        assert_eq!(grid.get(0, 2, 0), None);
        assert_eq!(grid.valid_cells(1), 3);
        assert_eq!(grid.extent(), BoundingBox::new(0.0, 0.0, 2.0, 2.0));
    }
}
