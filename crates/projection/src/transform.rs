//! Point transformation between reference systems.
//!
//! Every transformation pivots through geographic longitude/latitude. The
//! WGS 84, GDA94 and GDA2020 datums are treated as coincident: the shifts
//! between them are below airborne survey positioning accuracy.

use survey_common::{BoundingBox, ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

use crate::mercator::WebMercator;
use crate::transverse_mercator::TransverseMercator;

/// One side of a transformation.
#[derive(Debug, Clone)]
enum Projector {
    Geographic,
    TransverseMercator(TransverseMercator),
    WebMercator(WebMercator),
}

impl Projector {
    /// Fails for UTM systems built directly with a zone their datum lacks.
    fn for_system(system: &ReferenceSystem) -> SurveyResult<Self> {
        Ok(match *system {
            ReferenceSystem::Geographic { .. } => Projector::Geographic,
            ReferenceSystem::Utm { datum, zone, south } => {
                ReferenceSystem::utm(datum, zone, south)?;
                Projector::TransverseMercator(TransverseMercator::utm(datum, zone, south))
            }
            ReferenceSystem::WebMercator => Projector::WebMercator(WebMercator),
        })
    }

    fn to_geographic(&self, x: f64, y: f64) -> SurveyResult<(f64, f64)> {
        let (lon, lat) = match self {
            Projector::Geographic => (x, y),
            Projector::TransverseMercator(tm) => tm.inverse(x, y),
            Projector::WebMercator(wm) => wm.inverse(x, y),
        };
        if lat.abs() > 90.0 {
            return Err(SurveyError::transform(format!(
                "latitude {} out of range for point ({}, {})",
                lat, x, y
            )));
        }
        Ok((lon, lat))
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> SurveyResult<(f64, f64)> {
        match self {
            Projector::Geographic => Ok((lon, lat)),
            Projector::TransverseMercator(tm) => tm.forward(lon, lat).ok_or_else(|| {
                SurveyError::transform(format!(
                    "({}, {}) is more than 90 degrees from central meridian {}",
                    lon,
                    lat,
                    tm.central_meridian()
                ))
            }),
            Projector::WebMercator(wm) => Ok(wm.forward(lon, lat)),
        }
    }
}

/// A prepared transformation between two reference systems.
#[derive(Debug, Clone)]
pub struct Transformer {
    from: ReferenceSystem,
    to: ReferenceSystem,
    source: Projector,
    target: Projector,
}

impl Transformer {
    pub fn new(from: ReferenceSystem, to: ReferenceSystem) -> SurveyResult<Self> {
        Ok(Self {
            from,
            to,
            source: Projector::for_system(&from)?,
            target: Projector::for_system(&to)?,
        })
    }

    pub fn source(&self) -> ReferenceSystem {
        self.from
    }

    pub fn target(&self) -> ReferenceSystem {
        self.to
    }

    /// Whether the transformation leaves coordinates untouched.
    pub fn is_identity(&self) -> bool {
        self.from.is_equivalent(&self.to)
    }

    /// Transform a single point.
    ///
    /// Non-finite ordinates produce a NaN point rather than an error.
    pub fn transform_point(&self, x: f64, y: f64) -> SurveyResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        if !(x.is_finite() && y.is_finite()) {
            return Ok((f64::NAN, f64::NAN));
        }
        let (lon, lat) = self.source.to_geographic(x, y)?;
        self.target.from_geographic(lon, lat)
    }
}

/// Transform 2-D coordinates between reference systems.
///
/// `to == None` means "keep the native system" and returns the input
/// unchanged, as does a target equivalent to `from`. Fails on the first
/// point that cannot be transformed.
pub fn transform_coords(
    coords: &[[f64; 2]],
    from: &ReferenceSystem,
    to: Option<&ReferenceSystem>,
) -> SurveyResult<Vec<[f64; 2]>> {
    let Some(to) = to else {
        return Ok(coords.to_vec());
    };
    let transformer = Transformer::new(*from, *to)?;
    if transformer.is_identity() {
        return Ok(coords.to_vec());
    }

    debug!(points = coords.len(), from = %from, to = %to, "Transforming coordinates");

    coords
        .iter()
        .map(|&[x, y]| transformer.transform_point(x, y).map(|(x, y)| [x, y]))
        .collect()
}

/// Transform 3-D coordinates. The third ordinate passes through untouched.
pub fn transform_coords_3d(
    coords: &[[f64; 3]],
    from: &ReferenceSystem,
    to: Option<&ReferenceSystem>,
) -> SurveyResult<Vec<[f64; 3]>> {
    let Some(to) = to else {
        return Ok(coords.to_vec());
    };
    let transformer = Transformer::new(*from, *to)?;
    if transformer.is_identity() {
        return Ok(coords.to_vec());
    }

    coords
        .iter()
        .map(|&[x, y, z]| transformer.transform_point(x, y).map(|(x, y)| [x, y, z]))
        .collect()
}

/// Transform a flat, interleaved coordinate buffer with `ndim` values per point.
pub fn transform_flat(
    values: &[f64],
    ndim: usize,
    from: &ReferenceSystem,
    to: Option<&ReferenceSystem>,
) -> SurveyResult<Vec<f64>> {
    if ndim != 2 && ndim != 3 {
        return Err(SurveyError::dimension(format!(
            "coordinates must have 2 or 3 ordinates, got {}",
            ndim
        )));
    }
    if values.len() % ndim != 0 {
        return Err(SurveyError::dimension(format!(
            "{} values is not a whole number of {}-D points",
            values.len(),
            ndim
        )));
    }

    let Some(to) = to else {
        return Ok(values.to_vec());
    };
    let transformer = Transformer::new(*from, *to)?;
    if transformer.is_identity() {
        return Ok(values.to_vec());
    }

    let mut out = values.to_vec();
    for point in out.chunks_exact_mut(ndim) {
        let (x, y) = transformer.transform_point(point[0], point[1])?;
        point[0] = x;
        point[1] = y;
    }
    Ok(out)
}

/// Reproject a bounding box by transforming its corners and taking the envelope.
pub fn transform_bounds(
    bbox: &BoundingBox,
    from: &ReferenceSystem,
    to: &ReferenceSystem,
) -> SurveyResult<BoundingBox> {
    if from.is_equivalent(to) {
        return Ok(*bbox);
    }
    let corners = transform_coords(&bbox.corners(), from, Some(to))?;
    BoundingBox::envelope(corners.iter()).ok_or_else(|| {
        SurveyError::transform(format!("bounds {:?} have no finite image in {}", bbox, to))
    })
}

/// Projected system suited to measuring and gridding the given coordinates.
///
/// Projected native systems are returned unchanged. Geographic data maps to
/// the UTM (MGA on the GDA datums) zone containing the centroid of its
/// finite points.
pub fn default_projected_system(
    coords: &[[f64; 2]],
    native: &ReferenceSystem,
) -> SurveyResult<ReferenceSystem> {
    if !native.is_geographic() {
        return Ok(*native);
    }

    let (sum_x, sum_y, count) = coords
        .iter()
        .filter(|[x, y]| x.is_finite() && y.is_finite())
        .fold((0.0, 0.0, 0usize), |(sx, sy, n), [x, y]| (sx + x, sy + y, n + 1));
    if count == 0 {
        return Err(SurveyError::empty_selection(
            "no finite coordinates to choose a projected system from",
        ));
    }

    let system =
        ReferenceSystem::utm_for_location(sum_x / count as f64, sum_y / count as f64, native.datum());
    debug!(native = %native, projected = %system, "Selected projected system");
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_common::Datum;

    fn mga(zone: u8) -> ReferenceSystem {
        ReferenceSystem::utm(Datum::Gda94, zone, true).unwrap()
    }

    #[test]
    fn test_identity_is_bit_identical() {
        let coords = vec![[138.123456789, -34.987654321], [f64::NAN, 1.0]];
        let out = transform_coords(&coords, &ReferenceSystem::GDA94, Some(&ReferenceSystem::GDA94)).unwrap();
        assert_eq!(out[0][0].to_bits(), coords[0][0].to_bits());
        assert_eq!(out[0][1].to_bits(), coords[0][1].to_bits());
        assert!(out[1][0].is_nan());

        let native = transform_coords(&coords, &mga(54), None).unwrap();
        assert_eq!(native[0][0].to_bits(), coords[0][0].to_bits());
    }

    #[test]
    fn test_geographic_to_mga() {
        let out = transform_coords(
            &[[144.424867889, -37.951033417]],
            &ReferenceSystem::GDA94,
            Some(&mga(55)),
        )
        .unwrap();
        assert!((out[0][0] - 273741.297).abs() < 0.1);
        assert!((out[0][1] - 5796489.777).abs() < 0.1);
    }

    #[test]
    fn test_zone_to_zone() {
        let lonlat = [[141.5, -30.0]];
        let z54 = transform_coords(&lonlat, &ReferenceSystem::GDA94, Some(&mga(54))).unwrap();
        let z53 = transform_coords(&z54, &mga(54), Some(&mga(53))).unwrap();
        let back = transform_coords(&z53, &mga(53), Some(&ReferenceSystem::GDA94)).unwrap();
        assert!((back[0][0] - 141.5).abs() < 1e-7);
        assert!((back[0][1] + 30.0).abs() < 1e-7);
    }

    #[test]
    fn test_nan_passes_through() {
        let out = transform_coords(&[[f64::NAN, -30.0]], &ReferenceSystem::GDA94, Some(&mga(54))).unwrap();
        assert!(out[0][0].is_nan() && out[0][1].is_nan());
    }

    #[test]
    fn test_invalid_latitude_fails() {
        let result = transform_coords(&[[140.0, 95.0]], &ReferenceSystem::WGS84, Some(&mga(54)));
        assert!(matches!(result, Err(SurveyError::Transform(_))));
    }

    #[test]
    fn test_unchecked_utm_zone_is_rejected() {
        let zone_zero = ReferenceSystem::Utm {
            datum: Datum::Gda94,
            zone: 0,
            south: true,
        };
        let result = transform_coords(&[[138.0, -30.0]], &ReferenceSystem::GDA94, Some(&zone_zero));
        assert!(matches!(result, Err(SurveyError::UnresolvedSystem(_))));

        let northern_mga = ReferenceSystem::Utm {
            datum: Datum::Gda2020,
            zone: 54,
            south: false,
        };
        assert!(Transformer::new(northern_mga, ReferenceSystem::GDA2020).is_err());
        assert!(Transformer::new(mga(54), ReferenceSystem::GDA2020).is_ok());
    }

    #[test]
    fn test_3d_keeps_elevation() {
        let out = transform_coords_3d(
            &[[138.0, -30.0, 120.5]],
            &ReferenceSystem::GDA94,
            Some(&ReferenceSystem::WebMercator),
        )
        .unwrap();
        assert_eq!(out[0][2], 120.5);
        assert!(out[0][0] > 1.5e7);
    }

    #[test]
    fn test_flat_dimension_errors() {
        let sys = ReferenceSystem::WGS84;
        assert!(matches!(
            transform_flat(&[1.0, 2.0, 3.0, 4.0], 4, &sys, None),
            Err(SurveyError::Dimension(_))
        ));
        assert!(matches!(
            transform_flat(&[1.0, 2.0, 3.0], 2, &sys, None),
            Err(SurveyError::Dimension(_))
        ));
        let out = transform_flat(&[0.0, 0.0, 7.0], 3, &sys, Some(&ReferenceSystem::WebMercator)).unwrap();
        assert_eq!(out[2], 7.0);
    }

    #[test]
    fn test_transform_bounds_contains_corners() {
        let bbox = BoundingBox::new(138.0, -35.0, 139.0, -34.0);
        let projected = transform_bounds(&bbox, &ReferenceSystem::GDA94, &mga(54)).unwrap();
        for [x, y] in transform_coords(&bbox.corners(), &ReferenceSystem::GDA94, Some(&mga(54))).unwrap() {
            assert!(projected.contains_point(x, y));
        }
    }

    #[test]
    fn test_default_projected_system() {
        let coords = [[138.5, -34.9], [138.7, -34.8]];
        assert_eq!(
            default_projected_system(&coords, &ReferenceSystem::GDA94).unwrap().epsg(),
            28354
        );
        assert_eq!(default_projected_system(&coords, &mga(53)).unwrap(), mga(53));
        assert!(default_projected_system(&[[f64::NAN, 0.0]], &ReferenceSystem::GDA94).is_err());
    }
}
