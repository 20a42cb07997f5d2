//! In-memory point datasets and the sources they are loaded from.

use serde::Serialize;
use survey_common::{BoundingBox, ReferenceSystem, SurveyError, SurveyResult};
use tracing::debug;

/// Values of one attribute, one row per point.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    /// One value per point
    Scalar(Vec<f64>),
    /// `width` values per point, row-major (e.g. EM channels)
    Vector { width: usize, values: Vec<f64> },
}

impl AttributeValues {
    /// Number of rows (points).
    pub fn rows(&self) -> usize {
        match self {
            AttributeValues::Scalar(values) => values.len(),
            AttributeValues::Vector { width, values } => {
                if *width == 0 {
                    0
                } else {
                    values.len() / width
                }
            }
        }
    }

    /// Values per row. Scalars have width 1.
    pub fn width(&self) -> usize {
        match self {
            AttributeValues::Scalar(_) => 1,
            AttributeValues::Vector { width, .. } => *width,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, AttributeValues::Vector { .. })
    }

    /// Values of a single row.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        match self {
            AttributeValues::Scalar(values) => values.get(index..index + 1),
            AttributeValues::Vector { width, values } => {
                values.get(index * width..(index + 1) * width)
            }
        }
    }

    /// One column as a contiguous vector. Scalars only have column 0.
    pub fn column(&self, column: usize) -> Vec<f64> {
        match self {
            AttributeValues::Scalar(values) if column == 0 => values.clone(),
            AttributeValues::Scalar(_) => Vec::new(),
            AttributeValues::Vector { width, values } if column < *width => {
                values.iter().skip(column).step_by(*width).copied().collect()
            }
            AttributeValues::Vector { .. } => Vec::new(),
        }
    }

    /// Rows at the given indices, in the given order.
    pub fn select(&self, indices: &[usize]) -> AttributeValues {
        match self {
            AttributeValues::Scalar(values) => {
                AttributeValues::Scalar(indices.iter().map(|&i| values[i]).collect())
            }
            AttributeValues::Vector { width, values } => AttributeValues::Vector {
                width: *width,
                values: indices
                    .iter()
                    .flat_map(|&i| values[i * width..(i + 1) * width].iter().copied())
                    .collect(),
            },
        }
    }

    /// Rows in a contiguous range.
    pub fn slice(&self, start: usize, end: usize) -> AttributeValues {
        match self {
            AttributeValues::Scalar(values) => AttributeValues::Scalar(values[start..end].to_vec()),
            AttributeValues::Vector { width, values } => AttributeValues::Vector {
                width: *width,
                values: values[start * width..end * width].to_vec(),
            },
        }
    }
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub values: AttributeValues,
}

/// Anything that can supply line-survey points.
///
/// Implementations read lazily; [`PointDataset::from_source`] pulls
/// everything once.
pub trait PointSource {
    /// Point coordinates in the native reference system.
    fn coordinates(&self) -> SurveyResult<Vec<[f64; 2]>>;

    /// Names of the per-point attributes, in source order.
    fn attribute_names(&self) -> SurveyResult<Vec<String>>;

    /// Values of a named attribute.
    fn attribute(&self, name: &str) -> SurveyResult<AttributeValues>;

    /// Line membership of each point. `None` marks a point outside any line.
    fn line_numbers(&self) -> SurveyResult<Vec<Option<i64>>>;

    fn native_reference_system(&self) -> SurveyResult<ReferenceSystem>;
}

/// Points held in memory, used for tests and programmatic construction.
#[derive(Debug, Clone)]
pub struct MemoryPointSource {
    pub coordinates: Vec<[f64; 2]>,
    pub line_numbers: Vec<Option<i64>>,
    pub attributes: Vec<Attribute>,
    pub reference_system: ReferenceSystem,
}

impl MemoryPointSource {
    pub fn new(
        coordinates: Vec<[f64; 2]>,
        line_numbers: Vec<Option<i64>>,
        reference_system: ReferenceSystem,
    ) -> Self {
        Self {
            coordinates,
            line_numbers,
            attributes: Vec::new(),
            reference_system,
        }
    }

    /// Add a scalar attribute.
    pub fn with_scalar(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            values: AttributeValues::Scalar(values),
        });
        self
    }

    /// Add a vector attribute with `width` values per point.
    pub fn with_vector(mut self, name: impl Into<String>, width: usize, values: Vec<f64>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            values: AttributeValues::Vector { width, values },
        });
        self
    }
}

impl PointSource for MemoryPointSource {
    fn coordinates(&self) -> SurveyResult<Vec<[f64; 2]>> {
        Ok(self.coordinates.clone())
    }

    fn attribute_names(&self) -> SurveyResult<Vec<String>> {
        Ok(self.attributes.iter().map(|a| a.name.clone()).collect())
    }

    fn attribute(&self, name: &str) -> SurveyResult<AttributeValues> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.values.clone())
            .ok_or_else(|| SurveyError::AttributeNotFound(name.to_string()))
    }

    fn line_numbers(&self) -> SurveyResult<Vec<Option<i64>>> {
        Ok(self.line_numbers.clone())
    }

    fn native_reference_system(&self) -> SurveyResult<ReferenceSystem> {
        Ok(self.reference_system)
    }
}

/// Immutable snapshot of a line-survey dataset.
///
/// Every attribute has exactly one row per coordinate, in coordinate order.
#[derive(Debug, Clone)]
pub struct PointDataset {
    coordinates: Vec<[f64; 2]>,
    line_numbers: Vec<Option<i64>>,
    attributes: Vec<Attribute>,
    reference_system: ReferenceSystem,
}

impl PointDataset {
    /// Build a dataset, checking that all per-point arrays agree in length.
    pub fn new(
        coordinates: Vec<[f64; 2]>,
        line_numbers: Vec<Option<i64>>,
        attributes: Vec<Attribute>,
        reference_system: ReferenceSystem,
    ) -> SurveyResult<Self> {
        let n = coordinates.len();
        if line_numbers.len() != n {
            return Err(SurveyError::dimension(format!(
                "{} line memberships for {} points",
                line_numbers.len(),
                n
            )));
        }
        for attribute in &attributes {
            let values = &attribute.values;
            let shape_ok = match values {
                AttributeValues::Scalar(v) => v.len() == n,
                AttributeValues::Vector { width, values } => *width > 0 && values.len() == n * width,
            };
            if !shape_ok {
                return Err(SurveyError::dimension(format!(
                    "attribute '{}' has {} rows of width {}, expected {} rows",
                    attribute.name,
                    values.rows(),
                    values.width(),
                    n
                )));
            }
        }

        Ok(Self {
            coordinates,
            line_numbers,
            attributes,
            reference_system,
        })
    }

    /// Load every coordinate, line membership and attribute from a source.
    pub fn from_source(source: &dyn PointSource) -> SurveyResult<Self> {
        let coordinates = source.coordinates()?;
        let line_numbers = source.line_numbers()?;
        let reference_system = source.native_reference_system()?;
        let attributes = source
            .attribute_names()?
            .into_iter()
            .map(|name| {
                let values = source.attribute(&name)?;
                Ok(Attribute { name, values })
            })
            .collect::<SurveyResult<Vec<_>>>()?;

        debug!(
            points = coordinates.len(),
            attributes = attributes.len(),
            system = %reference_system,
            "Loaded point dataset"
        );

        Self::new(coordinates, line_numbers, attributes, reference_system)
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinates(&self) -> &[[f64; 2]] {
        &self.coordinates
    }

    pub fn line_numbers(&self) -> &[Option<i64>] {
        &self.line_numbers
    }

    pub fn reference_system(&self) -> ReferenceSystem {
        self.reference_system
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> SurveyResult<&AttributeValues> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.values)
            .ok_or_else(|| SurveyError::AttributeNotFound(name.to_string()))
    }

    /// Extent of the finite coordinates in the native system.
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::envelope(self.coordinates.iter())
    }

    /// Short description of the dataset.
    pub fn summary(&self) -> DatasetSummary {
        let mut lines: Vec<i64> = self.line_numbers.iter().flatten().copied().collect();
        lines.sort_unstable();
        lines.dedup();

        DatasetSummary {
            points: self.len(),
            lines: lines.len(),
            extent: self.extent(),
            reference_system: self.reference_system,
            attributes: self
                .attributes
                .iter()
                .map(|a| AttributeSummary {
                    name: a.name.clone(),
                    width: a.values.width(),
                })
                .collect(),
        }
    }
}

/// Overview of a dataset for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub points: usize,
    pub lines: usize,
    pub extent: Option<BoundingBox>,
    pub reference_system: ReferenceSystem,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeSummary {
    pub name: String,
    pub width: usize,
}
