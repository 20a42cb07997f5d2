//! Integration tests for spatial masks, line segmentation and distances.
//!
//! Uses the two-line scenario fixture and synthetic surveys from test-utils.

use line_processor::{
    and_masks, coords_to_distance, coords_to_distance_in, get_line_masks, get_lines,
    get_spatial_mask, median_sample_spacing, CoordinateUnits, LineIndex, LineMaskOptions,
    LineQuery, MemoryPointSource, PointDataset,
};
use survey_common::{BoundingBox, ReferenceSystem, SurveyError};
use test_utils::{assert_close, assert_uniform_spacing, create_survey_lines, fixtures, scenario, SurveySpec};

fn scenario_dataset() -> PointDataset {
    let source = MemoryPointSource::new(
        scenario::COORDINATES.to_vec(),
        scenario::line_membership(),
        ReferenceSystem::from_epsg(scenario::EPSG).unwrap(),
    )
    .with_scalar("mag", scenario::MAG.to_vec())
    .with_vector("em", 2, scenario::EM.to_vec());
    PointDataset::from_source(&source).unwrap()
}

fn survey_dataset(spec: &SurveySpec) -> PointDataset {
    let survey = create_survey_lines(spec);
    let source = MemoryPointSource::new(
        survey.coordinates,
        survey.line_numbers,
        ReferenceSystem::from_epsg(fixtures::epsg::MGA54).unwrap(),
    )
    .with_scalar("mag", survey.mag)
    .with_vector("em", 3, survey.em);
    PointDataset::from_source(&source).unwrap()
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_scenario_single_line_mask() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let options = LineMaskOptions {
        line_numbers: Some(vec![1]),
        ..Default::default()
    };

    let masks: Vec<(i64, Vec<bool>)> = get_line_masks(&dataset, &index, &options)
        .unwrap()
        .iter()
        .collect();

    assert_eq!(masks, vec![(1, vec![true, true, true, false, false])]);
}

#[test]
fn test_scenario_line_distance() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let query = LineQuery {
        line_numbers: Some(vec![1]),
        ..Default::default()
    };

    let records = get_lines(&dataset, &index, &query).unwrap();
    let line = records.iter().next().unwrap();
    let distance = coords_to_distance(&line.coordinates, CoordinateUnits::Projected).unwrap();

    assert_eq!(distance, vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_scenario_records_carry_attributes() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let records = get_lines(&dataset, &index, &LineQuery::default()).unwrap();

    assert_eq!(records.line_numbers(), vec![1, 2]);
    let lines: Vec<_> = records.iter().collect();
    assert_eq!(lines[1].indices, vec![3, 4]);

    let mag = lines[1].attribute("mag").unwrap();
    assert_eq!(mag.values.column(0), vec![20.0, 21.0]);

    let em = lines[1].attribute("em").unwrap();
    assert_eq!(em.values.width(), 2);
    assert_eq!(em.values.row(1), Some(&[5.0, 0.5][..]));
}

// ============================================================================
// Spatial masks
// ============================================================================

#[test]
fn test_full_extent_selects_everything() {
    let dataset = survey_dataset(&SurveySpec::default());
    let extent = dataset.extent().unwrap();
    let mask = get_spatial_mask(&dataset, &extent, None).unwrap();
    assert!(mask.iter().all(|m| *m));
}

#[test]
fn test_disjoint_bounds_select_nothing() {
    let dataset = scenario_dataset();
    let bounds = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
    let mask = get_spatial_mask(&dataset, &bounds, None).unwrap();
    assert_eq!(mask, vec![false; 5]);

    let index = LineIndex::from_dataset(&dataset).unwrap();
    let query = LineQuery {
        bounds: Some(bounds),
        ..Default::default()
    };
    assert!(get_lines(&dataset, &index, &query).unwrap().is_empty());
}

#[test]
fn test_geographic_bounds_on_projected_data() {
    // Degrees around the synthetic survey, which sits near 138.6E 35S
    let dataset = survey_dataset(&SurveySpec::default());
    let (min_x, min_y, max_x, max_y) = fixtures::bbox::ADELAIDE;
    let bounds = BoundingBox::new(min_x, min_y, max_x, max_y);

    let mask = get_spatial_mask(&dataset, &bounds, Some(&ReferenceSystem::GDA94)).unwrap();
    assert_eq!(mask.iter().filter(|m| **m).count(), dataset.len());

    let (min_x, min_y, max_x, max_y) = fixtures::bbox::BRISBANE;
    let elsewhere = BoundingBox::new(min_x, min_y, max_x, max_y);
    let mask = get_spatial_mask(&dataset, &elsewhere, Some(&ReferenceSystem::WGS84)).unwrap();
    assert!(mask.iter().all(|m| !*m));
}

#[test]
fn test_combined_masks() {
    let dataset = scenario_dataset();
    let left = get_spatial_mask(&dataset, &BoundingBox::new(0.0, 0.0, 1.0, 5.0), None).unwrap();
    let bottom = get_spatial_mask(&dataset, &BoundingBox::new(0.0, 0.0, 2.0, 0.0), None).unwrap();
    assert_eq!(
        and_masks(&left, &bottom).unwrap(),
        vec![true, true, false, false, false]
    );
}

// ============================================================================
// Line masks
// ============================================================================

#[test]
fn test_unknown_line_yields_nothing() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let options = LineMaskOptions {
        line_numbers: Some(vec![99]),
        ..Default::default()
    };
    let masks = get_line_masks(&dataset, &index, &options).unwrap();
    assert!(masks.is_empty());
    assert_eq!(masks.iter().count(), 0);
}

#[test]
fn test_masks_are_restartable() {
    let dataset = survey_dataset(&SurveySpec::default());
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let masks = get_line_masks(&dataset, &index, &LineMaskOptions::default()).unwrap();

    let first: Vec<(i64, Vec<bool>)> = masks.iter().collect();
    let second: Vec<(i64, Vec<bool>)> = (&masks).into_iter().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
    for (_, mask) in &first {
        assert_eq!(mask.iter().filter(|m| **m).count(), 100);
    }
}

#[test]
fn test_mask_cursor_reports_done() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let masks = get_line_masks(&dataset, &index, &LineMaskOptions::default()).unwrap();

    let mut cursor = masks.iter();
    assert_eq!(cursor.len(), 2);
    assert!(!cursor.is_done());
    assert_eq!(cursor.next().map(|(line, _)| line), Some(1));
    assert_eq!(cursor.next().map(|(line, _)| line), Some(2));
    assert!(cursor.is_done());
    assert_eq!(cursor.position(), 2);
    assert!(cursor.next().is_none());
}

#[test]
fn test_masks_partition_lines() {
    let dataset = survey_dataset(&SurveySpec {
        lines: 4,
        points_per_line: 7,
        ..Default::default()
    });
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let masks = get_line_masks(&dataset, &index, &LineMaskOptions::default()).unwrap();

    let mut covered = vec![0usize; dataset.len()];
    for (_, mask) in &masks {
        for (i, selected) in mask.iter().enumerate() {
            if *selected {
                covered[i] += 1;
            }
        }
    }
    assert!(covered.iter().all(|c| *c == 1));
}

#[test]
fn test_subset_mask_wrong_length() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let options = LineMaskOptions {
        subset_mask: Some(vec![true; 3]),
        ..Default::default()
    };
    assert!(matches!(
        get_line_masks(&dataset, &index, &options),
        Err(SurveyError::Dimension(_))
    ));
}

// ============================================================================
// Line records
// ============================================================================

#[test]
fn test_unknown_variable_is_rejected() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let query = LineQuery {
        variables: Some(vec!["gravity".to_string()]),
        ..Default::default()
    };
    assert!(matches!(
        get_lines(&dataset, &index, &query),
        Err(SurveyError::AttributeNotFound(_))
    ));
}

#[test]
fn test_subsampled_line_keeps_ends() {
    let dataset = survey_dataset(&SurveySpec {
        lines: 1,
        points_per_line: 101,
        ..Default::default()
    });
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let query = LineQuery {
        variables: Some(vec!["mag".to_string()]),
        subsampling_distance: Some(125.0),
        ..Default::default()
    };

    let records = get_lines(&dataset, &index, &query).unwrap();
    let line = records.iter().next().unwrap();
    // 1250 m line thinned to one point per 125 m
    assert_eq!(line.indices.first(), Some(&0));
    assert_eq!(line.indices.last(), Some(&100));
    assert_eq!(line.len(), 11);
    assert_eq!(line.attributes.len(), 1);
}

#[test]
fn test_bounded_contiguous_line() {
    let dataset = scenario_dataset();
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let query = LineQuery {
        bounds: Some(BoundingBox::new(1.0, -1.0, 3.0, 1.0)),
        contiguous: true,
        ..Default::default()
    };

    let records = get_lines(&dataset, &index, &query).unwrap();
    assert_eq!(records.line_numbers(), vec![1]);
    assert_eq!(records.iter().next().unwrap().indices, vec![1, 2]);
}

// ============================================================================
// Distance
// ============================================================================

#[test]
fn test_synthetic_line_distance() {
    let dataset = survey_dataset(&SurveySpec::default());
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let range = index.range(1010).unwrap();
    let coords = &dataset.coordinates()[range];

    let distance = coords_to_distance_in(coords, &dataset.reference_system()).unwrap();
    assert_eq!(distance[0], 0.0);
    assert_close(distance[99], 99.0 * 12.5, 1e-9);
    assert_uniform_spacing(&distance, 12.5, 1e-9);
    assert!(distance.windows(2).all(|pair| pair[1] >= pair[0]));
}

#[test]
fn test_synthetic_sample_spacing() {
    let dataset = survey_dataset(&SurveySpec::default());
    let index = LineIndex::from_dataset(&dataset).unwrap();
    let range = index.range(1000).unwrap();

    let spacing =
        median_sample_spacing(&dataset.coordinates()[range], &dataset.reference_system(), 10).unwrap();
    assert_eq!(spacing, 12.5);
}

#[test]
fn test_geographic_distance_rejected() {
    let result = coords_to_distance_in(&[[138.0, -35.0], [138.1, -35.0]], &ReferenceSystem::GDA94);
    assert!(matches!(result, Err(SurveyError::Units(_))));
}
