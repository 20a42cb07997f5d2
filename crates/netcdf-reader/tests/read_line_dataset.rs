//! Round-trip tests: write small line datasets with the netcdf crate and
//! read them back through `NetCdfLineSource`.

use std::path::Path;

use line_processor::{get_line_masks, LineIndex, LineMaskOptions, PointDataset, PointSource};
use netcdf_reader::{NetCdfError, NetCdfLineSource};
use survey_common::{ReferenceSystem, SurveyError};
use test_utils::{require_test_file, scenario};

/// Scenario dataset with `line(line)` + `line_index(point)` in MGA zone 54.
fn write_indexed_file(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("point", 5).unwrap();
    file.add_dimension("line", 2).unwrap();
    file.add_dimension("em_channel", 2).unwrap();

    let xs: Vec<f64> = scenario::COORDINATES.iter().map(|p| p[0]).collect();
    let ys: Vec<f64> = scenario::COORDINATES.iter().map(|p| p[1]).collect();
    let mut var = file.add_variable::<f64>("easting", &["point"]).unwrap();
    var.put_values(&xs, ..).unwrap();
    let mut var = file.add_variable::<f64>("northing", &["point"]).unwrap();
    var.put_values(&ys, ..).unwrap();

    let mut var = file.add_variable::<i32>("line", &["line"]).unwrap();
    var.put_values(&[1i32, 2], ..).unwrap();
    let mut var = file.add_variable::<i32>("line_index", &["point"]).unwrap();
    var.put_values(&[0i32, 0, 0, 1, 1], ..).unwrap();

    let mut var = file.add_variable::<i32>("crs", &[]).unwrap();
    var.put_attribute("spatial_ref", "EPSG:28354").unwrap();

    // Packed channel: stored as tenths, -1 marks a dropout
    let mut var = file.add_variable::<i32>("mag", &["point"]).unwrap();
    var.put_values(&[100i32, 110, -1, 200, 210], ..).unwrap();
    var.put_attribute("scale_factor", 0.1f64).unwrap();
    var.put_attribute("missing_value", -1i32).unwrap();

    let mut var = file.add_variable::<f64>("em", &["point", "em_channel"]).unwrap();
    var.put_values(&scenario::EM, ..).unwrap();
}

/// Two lines with a per-point `line` variable and no `crs` variable.
fn write_per_point_file(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("point", 4).unwrap();

    let mut var = file.add_variable::<f64>("longitude", &["point"]).unwrap();
    var.put_values(&[138.50, 138.51, 138.50, 138.51], ..).unwrap();
    let mut var = file.add_variable::<f64>("latitude", &["point"]).unwrap();
    var.put_values(&[-35.0, -35.0, -34.99, -34.99], ..).unwrap();
    let mut var = file.add_variable::<i32>("line", &["point"]).unwrap();
    var.put_values(&[1010i32, 1010, 1020, 1020], ..).unwrap();
    let mut var = file.add_variable::<f32>("grav", &["point"]).unwrap();
    var.put_values(&[1.0f32, 2.0, 3.0, 4.0], ..).unwrap();
}

// ============================================================================
// Indexed layout
// ============================================================================

#[test]
fn test_indexed_layout_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.nc");
    write_indexed_file(&path);

    let source = NetCdfLineSource::open(&path).unwrap();
    assert_eq!(source.point_count(), 5);
    assert_eq!(
        source.native_reference_system().unwrap(),
        ReferenceSystem::from_epsg(28354).unwrap()
    );
    assert_eq!(source.attribute_names().unwrap(), vec!["mag", "em"]);

    let dataset = PointDataset::from_source(&source).unwrap();
    assert_eq!(dataset.coordinates(), &scenario::COORDINATES[..]);
    assert_eq!(dataset.line_numbers(), &scenario::line_membership()[..]);

    let index = LineIndex::from_dataset(&dataset).unwrap();
    let options = LineMaskOptions {
        line_numbers: Some(vec![1]),
        ..Default::default()
    };
    let masks: Vec<_> = get_line_masks(&dataset, &index, &options).unwrap().iter().collect();
    assert_eq!(masks, vec![(1, vec![true, true, true, false, false])]);
}

#[test]
fn test_packed_attribute_is_unpacked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.nc");
    write_indexed_file(&path);

    let source = NetCdfLineSource::open(&path).unwrap();
    let mag = source.attribute("mag").unwrap().column(0);
    assert!((mag[0] - 10.0).abs() < 1e-9);
    assert!((mag[4] - 21.0).abs() < 1e-9);
    assert!(mag[2].is_nan());

    let em = source.attribute("em").unwrap();
    assert_eq!(em.width(), 2);
    assert_eq!(em.row(2), Some(&[3.0, 0.3][..]));
}

#[test]
fn test_unknown_attribute() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.nc");
    write_indexed_file(&path);

    let source = NetCdfLineSource::open(&path).unwrap();
    assert!(matches!(
        source.attribute("line_index"),
        Err(SurveyError::AttributeNotFound(_))
    ));
}

// ============================================================================
// Per-point layout
// ============================================================================

#[test]
fn test_per_point_lines_default_to_gda94() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("per_point.nc");
    write_per_point_file(&path);

    let source = NetCdfLineSource::open(&path).unwrap();
    assert_eq!(source.native_reference_system().unwrap(), ReferenceSystem::GDA94);
    assert_eq!(
        source.line_numbers().unwrap(),
        vec![Some(1010), Some(1010), Some(1020), Some(1020)]
    );

    let dataset = PointDataset::from_source(&source).unwrap();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    assert_eq!(index.line_numbers().collect::<Vec<_>>(), vec![1010, 1020]);
    assert_eq!(dataset.attribute("grav").unwrap().column(0), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_scalar_line_puts_every_point_on_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single_line.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("point", 3).unwrap();
        let mut var = file.add_variable::<f64>("longitude", &["point"]).unwrap();
        var.put_values(&[138.50, 138.51, 138.52], ..).unwrap();
        let mut var = file.add_variable::<f64>("latitude", &["point"]).unwrap();
        var.put_values(&[-35.0, -35.0, -35.0], ..).unwrap();
        let mut var = file.add_variable::<i32>("line", &[]).unwrap();
        var.put_values(&[3050i32], ..).unwrap();
        let mut var = file.add_variable::<f32>("grav", &["point"]).unwrap();
        var.put_values(&[1.0f32, 2.0, 3.0], ..).unwrap();
    }

    let source = NetCdfLineSource::open(&path).unwrap();
    assert_eq!(source.line_numbers().unwrap(), vec![Some(3050); 3]);
    assert_eq!(source.attribute_names().unwrap(), vec!["grav"]);

    let dataset = PointDataset::from_source(&source).unwrap();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let masks: Vec<_> = get_line_masks(&dataset, &index, &LineMaskOptions::default())
        .unwrap()
        .iter()
        .collect();
    assert_eq!(masks, vec![(3050, vec![true, true, true])]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_projected_file_requires_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_crs.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("point", 2).unwrap();
        for name in ["easting", "northing"] {
            let mut var = file.add_variable::<f64>(name, &["point"]).unwrap();
            var.put_values(&[0.0, 1.0], ..).unwrap();
        }
        let mut var = file.add_variable::<i32>("line", &["point"]).unwrap();
        var.put_values(&[1i32, 1], ..).unwrap();
    }

    let result = NetCdfLineSource::open(&path);
    assert!(matches!(result, Err(NetCdfError::MissingData(_))));
}

#[test]
fn test_missing_file() {
    let result = NetCdfLineSource::open("/nonexistent/survey.nc");
    assert!(matches!(result, Err(NetCdfError::IoError(_))));

    let err: SurveyError = result.unwrap_err().into();
    assert!(matches!(err, SurveyError::DataRead(_)));
}

// ============================================================================
// Real survey data (skipped when absent)
// ============================================================================

#[test]
fn test_real_survey_file() {
    let path = require_test_file!("survey_lines.nc");
    let source = NetCdfLineSource::open(&path).unwrap();
    let dataset = PointDataset::from_source(&source).unwrap();
    let index = LineIndex::from_dataset(&dataset).unwrap();

    assert!(!dataset.is_empty());
    assert!(!index.is_empty());
    assert_eq!(index.point_count(), dataset.len());
}
