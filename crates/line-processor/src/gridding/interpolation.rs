//! Inverse-distance-weighted interpolation onto raster cell centres.

use survey_common::GeoTransform;

/// Upper bound on buckets along each axis.
const MAX_BUCKETS_PER_AXIS: f64 = 1024.0;

/// Uniform bucket grid over the points for radius searches.
struct PointBuckets {
    min_x: f64,
    min_y: f64,
    size: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<usize>>,
}

impl PointBuckets {
    fn new(points: &[[f64; 2]], size: f64) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &[x, y] in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if points.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let size = size
            .max((max_x - min_x) / MAX_BUCKETS_PER_AXIS)
            .max((max_y - min_y) / MAX_BUCKETS_PER_AXIS);
        let cols = ((max_x - min_x) / size).floor() as usize + 1;
        let rows = ((max_y - min_y) / size).floor() as usize + 1;
        let mut buckets = vec![Vec::new(); cols * rows];
        for (i, &[x, y]) in points.iter().enumerate() {
            let col = (((x - min_x) / size) as usize).min(cols - 1);
            let row = (((y - min_y) / size) as usize).min(rows - 1);
            buckets[row * cols + col].push(i);
        }

        Self {
            min_x,
            min_y,
            size,
            cols,
            rows,
            buckets,
        }
    }

    /// Indices of points in buckets overlapping the square around (x, y).
    fn candidates(&self, x: f64, y: f64, radius: f64) -> impl Iterator<Item = usize> + '_ {
        let outside = x + radius < self.min_x
            || y + radius < self.min_y
            || x - radius > self.min_x + self.cols as f64 * self.size
            || y - radius > self.min_y + self.rows as f64 * self.size;

        let (c0, c1, r0, r1) = if outside {
            (1, 0, 1, 0)
        } else {
            (
                self.bucket(x - radius, self.min_x, self.cols),
                self.bucket(x + radius, self.min_x, self.cols),
                self.bucket(y - radius, self.min_y, self.rows),
                self.bucket(y + radius, self.min_y, self.rows),
            )
        };

        (r0..=r1)
            .flat_map(move |row| (c0..=c1).map(move |col| row * self.cols + col))
            .flat_map(move |bucket| self.buckets[bucket].iter().copied())
    }

    /// Bucket along one axis, clamped to the grid.
    fn bucket(&self, v: f64, min: f64, count: usize) -> usize {
        let b = ((v - min) / self.size).floor();
        if b <= 0.0 {
            0
        } else {
            (b as usize).min(count - 1)
        }
    }
}

/// Interpolate values at every cell centre from the points within `radius`.
///
/// Weights are `1 / d^power`; a point exactly on a cell centre gives that
/// cell its value. Cells with no point in range hold `no_data`. NaN values
/// never contribute.
#[allow(clippy::too_many_arguments)]
pub fn inverse_distance(
    points: &[[f64; 2]],
    values: &[f64],
    geotransform: &GeoTransform,
    width: usize,
    height: usize,
    radius: f64,
    power: f64,
    no_data: f32,
) -> Vec<f32> {
    let valid: Vec<usize> = (0..points.len().min(values.len()))
        .filter(|&i| !values[i].is_nan())
        .collect();
    let valid_points: Vec<[f64; 2]> = valid.iter().map(|&i| points[i]).collect();
    let buckets = PointBuckets::new(&valid_points, radius);
    let radius_sq = radius * radius;

    let mut output = vec![no_data; width * height];
    for row in 0..height {
        for col in 0..width {
            let (cx, cy) = geotransform.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);

            let mut weight_sum = 0.0;
            let mut value_sum = 0.0;
            let mut exact: Option<f64> = None;
            for candidate in buckets.candidates(cx, cy, radius) {
                let [x, y] = valid_points[candidate];
                let d_sq = (x - cx).powi(2) + (y - cy).powi(2);
                if d_sq > radius_sq {
                    continue;
                }
                let value = values[valid[candidate]];
                if d_sq == 0.0 {
                    exact.get_or_insert(value);
                    continue;
                }
                let weight = 1.0 / d_sq.sqrt().powf(power);
                weight_sum += weight;
                value_sum += weight * value;
            }

            let cell = &mut output[row * width + col];
            if let Some(value) = exact {
                *cell = value as f32;
            } else if weight_sum > 0.0 {
                *cell = (value_sum / weight_sum) as f32;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equidistant_points_average() {
        // One cell centred on (0.5, 0.5)
        let gt = GeoTransform::north_up(0.0, 1.0, 1.0);
        let points = [[0.0, 0.5], [1.0, 0.5]];
        let grid = inverse_distance(&points, &[2.0, 4.0], &gt, 1, 1, 1.0, 2.0, f32::NAN);
        assert!((grid[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_exact_hit_wins() {
        let gt = GeoTransform::north_up(0.0, 1.0, 1.0);
        let points = [[0.5, 0.5], [0.9, 0.5]];
        let grid = inverse_distance(&points, &[7.0, 100.0], &gt, 1, 1, 1.0, 2.0, f32::NAN);
        assert_eq!(grid[0], 7.0);
    }

    #[test]
    fn test_out_of_radius_is_no_data() {
        let gt = GeoTransform::north_up(0.0, 2.0, 1.0);
        let points = [[0.5, 1.5]];
        let grid = inverse_distance(&points, &[1.0], &gt, 2, 2, 0.5, 2.0, -9999.0);
        assert_eq!(grid, vec![1.0, -9999.0, -9999.0, -9999.0]);
    }

    #[test]
    fn test_nan_values_ignored() {
        let gt = GeoTransform::north_up(0.0, 1.0, 1.0);
        let points = [[0.4, 0.5], [0.6, 0.5]];
        let grid = inverse_distance(&points, &[f64::NAN, 5.0], &gt, 1, 1, 1.0, 2.0, f32::NAN);
        assert_eq!(grid[0], 5.0);
    }
}
