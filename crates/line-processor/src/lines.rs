//! Line segmentation: per-line masks, records and sample points.
//!
//! Points of one survey line are stored contiguously, so a line is fully
//! described by a half-open `[start, end)` range over the point sequence.

use std::collections::BTreeMap;
use std::ops::Range;

use survey_common::{BoundingBox, ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

use crate::dataset::{Attribute, PointDataset};
use crate::spatial::get_spatial_mask;

/// Map from line number to the point range holding that line.
///
/// Ranges are non-empty, disjoint and ordered by line number.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    ranges: BTreeMap<i64, Range<usize>>,
    point_count: usize,
}

impl LineIndex {
    /// Build an index from per-point line membership.
    ///
    /// Fails if a line number occurs in more than one separate run of points.
    pub fn build(line_numbers: &[Option<i64>]) -> SurveyResult<Self> {
        let mut ranges = BTreeMap::new();
        let mut run: Option<(i64, usize)> = None;

        let mut close = |line: i64, start: usize, end: usize| -> SurveyResult<()> {
            if let Some(existing) = ranges.insert(line, start..end) {
                return Err(SurveyError::InvalidLineIndex(format!(
                    "line {} occupies points {:?} and {:?}",
                    line,
                    existing,
                    start..end
                )));
            }
            Ok(())
        };

        for (i, line) in line_numbers.iter().enumerate() {
            match (run, *line) {
                (Some((current, _)), Some(line)) if current == line => {}
                (Some((current, start)), next) => {
                    close(current, start, i)?;
                    run = next.map(|line| (line, i));
                }
                (None, next) => run = next.map(|line| (line, i)),
            }
        }
        if let Some((current, start)) = run {
            close(current, start, line_numbers.len())?;
        }

        debug!(lines = ranges.len(), points = line_numbers.len(), "Built line index");
        Ok(Self {
            ranges,
            point_count: line_numbers.len(),
        })
    }

    pub fn from_dataset(dataset: &PointDataset) -> SurveyResult<Self> {
        Self::build(dataset.line_numbers())
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of points the index was built over.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Line numbers in ascending order.
    pub fn line_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.keys().copied()
    }

    /// Point range of a line.
    pub fn range(&self, line: i64) -> Option<Range<usize>> {
        self.ranges.get(&line).cloned()
    }

    /// `(line_number, range)` pairs in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, Range<usize>)> + '_ {
        self.ranges.iter().map(|(line, range)| (*line, range.clone()))
    }

    fn check_dataset(&self, dataset: &PointDataset) -> SurveyResult<()> {
        if self.point_count != dataset.len() {
            return Err(SurveyError::InvalidLineIndex(format!(
                "index covers {} points but dataset has {}",
                self.point_count,
                dataset.len()
            )));
        }
        Ok(())
    }

    /// Requested lines that exist in the index, ascending and de-duplicated.
    fn resolve(&self, requested: Option<&[i64]>) -> Vec<(i64, Range<usize>)> {
        match requested {
            None => self.iter().collect(),
            Some(lines) => {
                let mut lines = lines.to_vec();
                lines.sort_unstable();
                lines.dedup();
                lines
                    .into_iter()
                    .filter_map(|line| {
                        let range = self.range(line);
                        if range.is_none() {
                            debug!(line, "Requested line not in index");
                        }
                        range.map(|r| (line, r))
                    })
                    .collect()
            }
        }
    }
}

/// Options for [`get_line_masks`].
#[derive(Debug, Clone, Default)]
pub struct LineMaskOptions {
    /// Lines to select; `None` selects every indexed line
    pub line_numbers: Option<Vec<i64>>,
    /// Restrict each line to these points (e.g. a spatial mask)
    pub subset_mask: Option<Vec<bool>>,
    /// Fill gaps between the first and last selected point of each line
    pub contiguous: bool,
}

/// Selection of a single line.
#[derive(Debug, Clone)]
struct LineSelection {
    line: i64,
    /// Span of the line's selected points
    range: Range<usize>,
}

/// Finite, restartable sequence of `(line_number, mask)` pairs.
#[derive(Debug, Clone)]
pub struct LineMasks {
    point_count: usize,
    selections: Vec<LineSelection>,
    subset: Option<Vec<bool>>,
    contiguous: bool,
}

impl LineMasks {
    /// Number of masks the sequence yields.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Line numbers in yield order.
    pub fn line_numbers(&self) -> Vec<i64> {
        self.selections.iter().map(|s| s.line).collect()
    }

    /// Start a new pass over the masks.
    pub fn iter(&self) -> LineMaskCursor<'_> {
        LineMaskCursor {
            masks: self,
            position: 0,
        }
    }

    fn is_selected(&self, point: usize) -> bool {
        self.contiguous || self.subset.as_ref().map_or(true, |subset| subset[point])
    }

    fn indices(&self, selection: &LineSelection) -> Vec<usize> {
        selection
            .range
            .clone()
            .filter(|&i| self.is_selected(i))
            .collect()
    }

    fn mask(&self, selection: &LineSelection) -> Vec<bool> {
        let mut mask = vec![false; self.point_count];
        for i in selection.range.clone() {
            mask[i] = self.is_selected(i);
        }
        mask
    }
}

impl<'a> IntoIterator for &'a LineMasks {
    type Item = (i64, Vec<bool>);
    type IntoIter = LineMaskCursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Explicit cursor over a [`LineMasks`] sequence.
#[derive(Debug, Clone)]
pub struct LineMaskCursor<'a> {
    masks: &'a LineMasks,
    position: usize,
}

impl LineMaskCursor<'_> {
    /// Whether every mask has been yielded.
    pub fn is_done(&self) -> bool {
        self.position >= self.masks.selections.len()
    }

    /// Number of masks already yielded.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for LineMaskCursor<'_> {
    type Item = (i64, Vec<bool>);

    fn next(&mut self) -> Option<Self::Item> {
        let selection = self.masks.selections.get(self.position)?;
        self.position += 1;
        Some((selection.line, self.masks.mask(selection)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.masks.selections.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LineMaskCursor<'_> {}

/// Build one boolean mask per requested line, in ascending line order.
///
/// Unknown line numbers are skipped. With a subset mask, lines holding no
/// subset point are skipped as well.
pub fn get_line_masks(
    dataset: &PointDataset,
    index: &LineIndex,
    options: &LineMaskOptions,
) -> SurveyResult<LineMasks> {
    index.check_dataset(dataset)?;
    if let Some(subset) = &options.subset_mask {
        if subset.len() != dataset.len() {
            return Err(SurveyError::dimension(format!(
                "subset mask has {} entries for {} points",
                subset.len(),
                dataset.len()
            )));
        }
    }

    let selections: Vec<LineSelection> = index
        .resolve(options.line_numbers.as_deref())
        .into_iter()
        .filter_map(|(line, range)| match &options.subset_mask {
            None => Some(LineSelection { line, range }),
            Some(subset) => {
                let first = range.clone().find(|&i| subset[i])?;
                let last = range.clone().rev().find(|&i| subset[i])?;
                Some(LineSelection {
                    line,
                    range: first..last + 1,
                })
            }
        })
        .collect();

    debug!(
        lines = selections.len(),
        subset = options.subset_mask.is_some(),
        contiguous = options.contiguous,
        "Prepared line masks"
    );

    Ok(LineMasks {
        point_count: dataset.len(),
        selections,
        subset: options.subset_mask.clone(),
        contiguous: options.contiguous,
    })
}

/// Query for [`get_lines`].
#[derive(Debug, Clone, Default)]
pub struct LineQuery {
    /// Lines to retrieve; `None` retrieves every line
    pub line_numbers: Option<Vec<i64>>,
    /// Attributes to include; `None` includes all of them
    pub variables: Option<Vec<String>>,
    /// Keep only points inside these bounds
    pub bounds: Option<BoundingBox>,
    /// System of `bounds`, native when `None`
    pub bounds_system: Option<ReferenceSystem>,
    /// Approximate spacing between returned points, in native units
    pub subsampling_distance: Option<f64>,
    /// Fill gaps in bounded lines between their first and last selected point
    pub contiguous: bool,
}

/// Points and attributes of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub line_number: i64,
    /// Dataset indices of the returned points, ascending
    pub indices: Vec<usize>,
    pub coordinates: Vec<[f64; 2]>,
    pub attributes: Vec<Attribute>,
}

impl LineRecord {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Finite, restartable sequence of line records.
#[derive(Debug, Clone)]
pub struct LineRecords<'a> {
    dataset: &'a PointDataset,
    masks: LineMasks,
    variables: Vec<String>,
    subsampling_distance: Option<f64>,
}

impl<'a> LineRecords<'a> {
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn line_numbers(&self) -> Vec<i64> {
        self.masks.line_numbers()
    }

    /// Start a new pass over the records.
    pub fn iter(&self) -> LineRecordCursor<'_, 'a> {
        LineRecordCursor {
            records: self,
            position: 0,
        }
    }

    fn record(&self, selection: &LineSelection) -> LineRecord {
        let mut indices = self.masks.indices(selection);
        if let Some(distance) = self.subsampling_distance {
            indices = subsample(&indices, self.dataset.coordinates(), distance);
        }

        let coordinates = indices.iter().map(|&i| self.dataset.coordinates()[i]).collect();
        let attributes = self
            .variables
            .iter()
            .filter_map(|name| {
                let values = self.dataset.attribute(name).ok()?;
                Some(Attribute {
                    name: name.clone(),
                    values: values.select(&indices),
                })
            })
            .collect();

        LineRecord {
            line_number: selection.line,
            indices,
            coordinates,
            attributes,
        }
    }
}

impl<'r, 'a> IntoIterator for &'r LineRecords<'a> {
    type Item = LineRecord;
    type IntoIter = LineRecordCursor<'r, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Explicit cursor over a [`LineRecords`] sequence.
#[derive(Debug, Clone)]
pub struct LineRecordCursor<'r, 'a> {
    records: &'r LineRecords<'a>,
    position: usize,
}

impl LineRecordCursor<'_, '_> {
    pub fn is_done(&self) -> bool {
        self.position >= self.records.masks.selections.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for LineRecordCursor<'_, '_> {
    type Item = LineRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let selection = self.records.masks.selections.get(self.position)?;
        self.position += 1;
        Some(self.records.record(selection))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .records
            .masks
            .selections
            .len()
            .saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LineRecordCursor<'_, '_> {}

/// Retrieve per-line coordinates and attributes.
///
/// Lines not present in the index produce no record.
pub fn get_lines<'a>(
    dataset: &'a PointDataset,
    index: &LineIndex,
    query: &LineQuery,
) -> SurveyResult<LineRecords<'a>> {
    let variables = match &query.variables {
        Some(names) => {
            for name in names {
                dataset.attribute(name)?;
            }
            names.clone()
        }
        None => dataset.attribute_names().map(str::to_string).collect(),
    };

    if let Some(distance) = query.subsampling_distance {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(SurveyError::InvalidDistance(distance));
        }
    }

    let subset_mask = match &query.bounds {
        Some(bounds) => Some(get_spatial_mask(dataset, bounds, query.bounds_system.as_ref())?),
        None => None,
    };

    let masks = get_line_masks(
        dataset,
        index,
        &LineMaskOptions {
            line_numbers: query.line_numbers.clone(),
            subset_mask,
            contiguous: query.contiguous,
        },
    )?;

    Ok(LineRecords {
        dataset,
        masks,
        variables,
        subsampling_distance: query.subsampling_distance,
    })
}

/// Thin a line's points to roughly one per `distance`, keeping the last point.
///
/// The stride is derived from the straight-line distance between the first
/// and last point, so winding lines are thinned less than their length
/// would suggest.
fn subsample(indices: &[usize], coords: &[[f64; 2]], distance: f64) -> Vec<usize> {
    let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
        return Vec::new();
    };
    let [x0, y0] = coords[first];
    let [x1, y1] = coords[last];
    let line_length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();

    let stride = ((indices.len() as f64 / (line_length / distance).max(1.0)) as usize).max(1);

    let mut kept: Vec<usize> = indices.iter().step_by(stride).copied().collect();
    if kept.last() != Some(&last) {
        kept.push(last);
    }
    kept
}

/// Start, division and end points of every line.
///
/// Points with NaN coordinates are ignored. `divisions` of 1 gives the
/// start and end points only. The result is ordered by point index and
/// contains each point at most once.
pub fn line_sample_points(
    dataset: &PointDataset,
    index: &LineIndex,
    divisions: usize,
) -> SurveyResult<Vec<[f64; 2]>> {
    index.check_dataset(dataset)?;
    let coords = dataset.coordinates();
    let divisions = divisions.max(1);

    let mut sample_indices = Vec::new();
    for (line, range) in index.iter() {
        let valid: Vec<usize> = range
            .filter(|&i| coords[i][0].is_finite() && coords[i][1].is_finite())
            .collect();
        let Some(&last) = valid.last() else {
            debug!(line, "No valid coordinates in line");
            continue;
        };

        let increment = (valid.len() / divisions).max(1);
        sample_indices.extend(valid.iter().step_by(increment).copied());
        sample_indices.push(last);
    }

    sample_indices.sort_unstable();
    sample_indices.dedup();
    Ok(sample_indices.into_iter().map(|i| coords[i]).collect())
}

/// Start and end points of every line.
pub fn line_start_end_points(dataset: &PointDataset, index: &LineIndex) -> SurveyResult<Vec<[f64; 2]>> {
    line_sample_points(dataset, index, 1)
}
