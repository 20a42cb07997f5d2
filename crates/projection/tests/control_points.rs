//! Transformations checked against published control points.

use projection::{transform_bounds, transform_coords, Transformer};
use survey_common::{BoundingBox, ReferenceSystem};
use test_utils::{assert_point_close, control_points, fixtures};

fn system(epsg: u32) -> ReferenceSystem {
    ReferenceSystem::from_epsg(epsg).unwrap()
}

#[test]
fn test_flinders_peak_to_mga55() {
    let (lon, lat, zone, easting, northing) = control_points::FLINDERS_PEAK;
    assert_eq!(zone, 55);

    let transformer = Transformer::new(system(fixtures::epsg::GDA94), system(fixtures::epsg::MGA55)).unwrap();
    let (x, y) = transformer.transform_point(lon, lat).unwrap();
    assert_point_close([x, y], [easting, northing], 0.1);
}

#[test]
fn test_flinders_peak_back_to_geographic() {
    let (lon, lat, _, easting, northing) = control_points::FLINDERS_PEAK;

    let coords = transform_coords(
        &[[easting, northing]],
        &system(fixtures::epsg::MGA55),
        Some(&system(fixtures::epsg::GDA2020)),
    )
    .unwrap();
    assert_point_close(coords[0], [lon, lat], 1e-6);
}

#[test]
fn test_adelaide_bounds_in_mga54() {
    let (min_x, min_y, max_x, max_y) = fixtures::bbox::ADELAIDE;
    let bounds = BoundingBox::new(min_x, min_y, max_x, max_y);

    let projected = transform_bounds(&bounds, &system(fixtures::epsg::GDA94), &system(fixtures::epsg::MGA54)).unwrap();
    // Adelaide sits in the western half of zone 54, around 6.1e6 m north
    assert!(projected.min_x > 240000.0 && projected.max_x < 320000.0, "{:?}", projected);
    assert!(projected.min_y > 6080000.0 && projected.max_y < 6180000.0, "{:?}", projected);
}

#[test]
fn test_web_mercator_round_trip_through_mga() {
    let points = [[138.6, -34.9], [138.7, -34.8]];
    let mercator = transform_coords(&points, &system(fixtures::epsg::WGS84), Some(&system(fixtures::epsg::WEB_MERCATOR))).unwrap();
    let mga = transform_coords(&mercator, &system(fixtures::epsg::WEB_MERCATOR), Some(&system(fixtures::epsg::MGA54))).unwrap();
    let back = transform_coords(&mga, &system(fixtures::epsg::MGA54), Some(&system(fixtures::epsg::WGS84))).unwrap();

    for (original, restored) in points.iter().zip(&back) {
        assert_point_close(*restored, *original, 1e-7);
    }
}
