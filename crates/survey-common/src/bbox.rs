//! Bounding box types and operations.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{SurveyError, SurveyResult};

/// An axis-aligned bounding box in some reference system.
///
/// Geographic systems use degrees, projected systems use metres. The box
/// does not carry its system; callers pass it alongside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box without validation.
    ///
    /// Use [`BoundingBox::try_new`] for values coming from callers.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a validated bounding box.
    ///
    /// All four values must be finite with `min_x <= max_x` and `min_y <= max_y`.
    pub fn try_new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> SurveyResult<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(SurveyError::InvalidBounds(format!(
                "non-finite value in ({}, {}, {}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        if min_x > max_x || min_y > max_y {
            return Err(SurveyError::InvalidBounds(format!(
                "minimum exceeds maximum in ({}, {}, {}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        Ok(Self::new(min_x, min_y, max_x, max_y))
    }

    /// Build from exactly four ordered values `[min_x, min_y, max_x, max_y]`.
    pub fn from_slice(values: &[f64]) -> SurveyResult<Self> {
        match values {
            [min_x, min_y, max_x, max_y] => Self::try_new(*min_x, *min_y, *max_x, *max_y),
            _ => Err(SurveyError::InvalidBounds(format!(
                "expected 4 values, got {}",
                values.len()
            ))),
        }
    }

    /// Envelope of a set of points, ignoring non-finite coordinates.
    ///
    /// Returns `None` when no finite point exists.
    pub fn envelope<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64; 2]>,
    {
        let mut bbox: Option<BoundingBox> = None;
        for &[x, y] in points {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            });
        }
        bbox
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centre point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Corner points, counter-clockwise from `(min_x, min_y)`.
    pub fn corners(&self) -> [[f64; 2]; 4] {
        [
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
        ]
    }

    /// Check if this bbox intersects another. Touching edges count.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Smallest bounding box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if a point lies within this bbox (edges inclusive).
    ///
    /// NaN ordinates are never contained.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl FromStr for BoundingBox {
    type Err = SurveyError;

    /// Parse "minx,miny,maxx,maxy".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| SurveyError::InvalidBounds(format!("invalid number '{}'", part.trim())))
            })
            .collect::<SurveyResult<Vec<f64>>>()?;
        Self::from_slice(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "138.5,-35.0,139.5,-34.0".parse().unwrap();
        assert_eq!(bbox.min_x, 138.5);
        assert_eq!(bbox.min_y, -35.0);
        assert_eq!(bbox.max_x, 139.5);
        assert_eq!(bbox.max_y, -34.0);
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.min_x, 5.0);
        assert_eq!(intersection.max_y, 10.0);
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 20.0, 8.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, -5.0, 20.0, 10.0));
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_envelope_skips_nan() {
        let points = [[1.0, 2.0], [f64::NAN, 7.0], [-3.0, 4.0]];
        let bbox = BoundingBox::envelope(points.iter()).unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 2.0, 1.0, 4.0));

        let empty: [[f64; 2]; 0] = [];
        assert!(BoundingBox::envelope(empty.iter()).is_none());
    }
}
