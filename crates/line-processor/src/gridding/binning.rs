//! Cell binning: nearest-point and mean aggregation.

use survey_common::GeoTransform;

/// Raster cell of every point, computed once and shared by all layers.
#[derive(Debug, Clone)]
pub struct CellAssignment {
    /// Row-major cell index per point; `None` for points off the raster
    pub cells: Vec<Option<usize>>,
    pub width: usize,
    pub height: usize,
    /// World coordinates of each cell centre, row-major
    pub centres: Vec<(f64, f64)>,
}

impl CellAssignment {
    /// Assign points to cells.
    ///
    /// Points exactly on the right or bottom edge of the raster belong to
    /// the last column or row.
    pub fn new(points: &[[f64; 2]], geotransform: &GeoTransform, width: usize, height: usize) -> Self {
        let cells = points
            .iter()
            .map(|&[x, y]| {
                let (col, row) = geotransform.world_to_pixel(x, y)?;
                let col = cell_coordinate(col, width)?;
                let row = cell_coordinate(row, height)?;
                Some(row * width + col)
            })
            .collect();

        let centres = (0..height)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| geotransform.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5))
            .collect();

        Self {
            cells,
            width,
            height,
            centres,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Fractional pixel position to a cell index along one axis.
fn cell_coordinate(position: f64, size: usize) -> Option<usize> {
    const EDGE_TOLERANCE: f64 = 1e-9;
    if !position.is_finite() || position < -EDGE_TOLERANCE || position > size as f64 + EDGE_TOLERANCE {
        return None;
    }
    Some((position.max(0.0).floor() as usize).min(size - 1))
}

/// Each cell takes the value of the point nearest its centre.
///
/// Ties go to the point with the lower index. NaN values never contribute.
pub fn nearest(cells: &CellAssignment, points: &[[f64; 2]], values: &[f64], no_data: f32) -> Vec<f32> {
    let mut best: Vec<Option<(f64, f64)>> = vec![None; cells.cell_count()];

    for ((cell, &[x, y]), &value) in cells.cells.iter().zip(points).zip(values) {
        let Some(cell) = *cell else { continue };
        if value.is_nan() {
            continue;
        }
        let (cx, cy) = cells.centres[cell];
        let distance = (x - cx).powi(2) + (y - cy).powi(2);
        match best[cell] {
            Some((d, _)) if d <= distance => {}
            _ => best[cell] = Some((distance, value)),
        }
    }

    best.into_iter()
        .map(|b| b.map_or(no_data, |(_, value)| value as f32))
        .collect()
}

/// Each cell takes the mean of the values falling in it.
pub fn mean(cells: &CellAssignment, values: &[f64], no_data: f32) -> Vec<f32> {
    let mut sums = vec![0.0f64; cells.cell_count()];
    let mut counts = vec![0usize; cells.cell_count()];

    for (cell, &value) in cells.cells.iter().zip(values) {
        let Some(cell) = *cell else { continue };
        if value.is_nan() {
            continue;
        }
        sums[cell] += value;
        counts[cell] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                no_data
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> GeoTransform {
        GeoTransform::north_up(0.0, 2.0, 1.0)
    }

    #[test]
    fn test_edges_fall_in_last_cell() {
        let points = [[0.0, 2.0], [2.0, 0.0], [1.5, 0.5], [3.0, 0.0]];
        let cells = CellAssignment::new(&points, &two_by_two(), 2, 2);
        assert_eq!(cells.cells, vec![Some(0), Some(3), Some(3), None]);
    }

    #[test]
    fn test_nearest_prefers_centre_and_lower_index() {
        // Cell (0, 0) has centre (0.5, 1.5)
        let points = [[0.1, 1.9], [0.5, 1.5], [0.5, 1.5], [1.5, 0.5]];
        let values = [1.0, 2.0, 3.0, 4.0];
        let cells = CellAssignment::new(&points, &two_by_two(), 2, 2);
        let grid = nearest(&cells, &points, &values, -9999.0);
        assert_eq!(grid, vec![2.0, -9999.0, -9999.0, 4.0]);
    }

    #[test]
    fn test_nearest_skips_nan_values() {
        let points = [[0.5, 1.5], [0.2, 1.2]];
        let values = [f64::NAN, 7.0];
        let cells = CellAssignment::new(&points, &two_by_two(), 2, 2);
        assert_eq!(nearest(&cells, &points, &values, -1.0)[0], 7.0);
    }

    #[test]
    fn test_mean() {
        let points = [[0.2, 1.2], [0.8, 1.8], [1.5, 0.5], [1.6, 0.6]];
        let values = [1.0, 3.0, 10.0, f64::NAN];
        let cells = CellAssignment::new(&points, &two_by_two(), 2, 2);
        let grid = mean(&cells, &values, -1.0);
        assert_eq!(grid, vec![2.0, -1.0, -1.0, 10.0]);
    }
}
