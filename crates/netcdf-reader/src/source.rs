//! Line-survey point data read from a NetCDF file.
//!
//! # File layout
//!
//! ```text
//! dimensions:  point = N ; line = L ;
//! variables:   longitude(point), latitude(point)    or easting(point), northing(point)
//!              line(line), line_index(point)         or line(point)   or scalar line
//!              crs                                   spatial_ref / crs_wkt / epsg_code
//!              <name>(point), <name>(point, n)       attributes
//! ```

use std::path::{Path, PathBuf};

use line_processor::{AttributeValues, PointSource};
use survey_common::{ReferenceSystem, SurveyError, SurveyResult};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{get_f64_attr, get_string_attr, read_integers, read_unpacked, silence_hdf5_errors};

/// Name of the per-point dimension.
pub const POINT_DIMENSION: &str = "point";

/// Coordinate variable pairs, in order of preference.
const COORDINATE_VARIABLES: [(&str, &str); 2] = [("longitude", "latitude"), ("easting", "northing")];

/// Variables that are structural rather than per-point attributes.
const RESERVED_VARIABLES: [&str; 7] = [
    "longitude",
    "latitude",
    "easting",
    "northing",
    "line",
    "line_index",
    "crs",
];

/// Reference system assumed for longitude/latitude files without a `crs` variable.
const DEFAULT_GEOGRAPHIC_SYSTEM: ReferenceSystem = ReferenceSystem::GDA94;

/// How line membership is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineLayout {
    /// `line(line)` with a `line_index(point)` into it
    Indexed,
    /// `line(point)`
    PerPoint,
    /// Scalar `line`: every point is on the one line
    Single,
}

/// A NetCDF line dataset opened for reading.
///
/// Values are read from the file on each call; use
/// [`line_processor::PointDataset::from_source`] to load everything once.
pub struct NetCdfLineSource {
    path: PathBuf,
    file: netcdf::File,
    point_count: usize,
    coordinate_variables: (&'static str, &'static str),
    line_layout: LineLayout,
    reference_system: ReferenceSystem,
    attribute_names: Vec<String>,
}

impl std::fmt::Debug for NetCdfLineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfLineSource")
            .field("path", &self.path)
            .field("point_count", &self.point_count)
            .field("reference_system", &self.reference_system)
            .field("attributes", &self.attribute_names.len())
            .finish()
    }
}

impl NetCdfLineSource {
    /// Open a line dataset and work out its layout.
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        silence_hdf5_errors();
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(NetCdfError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }

        let file = netcdf::open(&path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let point_count = file
            .dimension(POINT_DIMENSION)
            .ok_or_else(|| NetCdfError::MissingData("point dimension".to_string()))?
            .len();

        let coordinate_variables = COORDINATE_VARIABLES
            .into_iter()
            .find(|(x, y)| file.variable(x).is_some() && file.variable(y).is_some())
            .ok_or_else(|| {
                NetCdfError::MissingData("longitude/latitude or easting/northing variables".to_string())
            })?;

        let line_layout = detect_line_layout(&file)?;
        let reference_system = read_reference_system(&file, coordinate_variables)?;
        let attribute_names = discover_attributes(&file, point_count);

        info!(
            path = %path.display(),
            points = point_count,
            attributes = attribute_names.len(),
            system = %reference_system,
            "Opened line dataset"
        );

        Ok(Self {
            path,
            file,
            point_count,
            coordinate_variables,
            line_layout,
            reference_system,
            attribute_names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    fn variable(&self, name: &str) -> NetCdfResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))
    }

    fn read_coordinates(&self) -> NetCdfResult<Vec<[f64; 2]>> {
        let (x_name, y_name) = self.coordinate_variables;
        let xs = read_unpacked(&self.variable(x_name)?)?;
        let ys = read_unpacked(&self.variable(y_name)?)?;
        if xs.len() != self.point_count || ys.len() != self.point_count {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has {} values and {} has {}, expected {}",
                x_name,
                xs.len(),
                y_name,
                ys.len(),
                self.point_count
            )));
        }
        Ok(xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect())
    }

    fn read_line_numbers(&self) -> NetCdfResult<Vec<Option<i64>>> {
        let line_var = self.variable("line")?;
        match self.line_layout {
            LineLayout::PerPoint => read_integers(&line_var),
            LineLayout::Single => {
                let line = read_integers(&line_var)?.first().copied().flatten();
                Ok(vec![line; self.point_count])
            }
            LineLayout::Indexed => {
                let lines = read_integers(&line_var)?;
                let indices = read_integers(&self.variable("line_index")?)?;
                Ok(indices
                    .into_iter()
                    .map(|index| {
                        let index = usize::try_from(index?).ok()?;
                        lines.get(index).copied().flatten()
                    })
                    .collect())
            }
        }
    }

    fn read_attribute(&self, name: &str) -> NetCdfResult<AttributeValues> {
        let var = self.variable(name)?;
        let values = read_unpacked(&var)?;
        match var.dimensions() {
            [_] => Ok(AttributeValues::Scalar(values)),
            [_, columns] => Ok(AttributeValues::Vector {
                width: columns.len(),
                values,
            }),
            dims => Err(NetCdfError::InvalidFormat(format!(
                "{} has {} dimensions",
                name,
                dims.len()
            ))),
        }
    }
}

impl PointSource for NetCdfLineSource {
    fn coordinates(&self) -> SurveyResult<Vec<[f64; 2]>> {
        Ok(self.read_coordinates()?)
    }

    fn attribute_names(&self) -> SurveyResult<Vec<String>> {
        Ok(self.attribute_names.clone())
    }

    fn attribute(&self, name: &str) -> SurveyResult<AttributeValues> {
        if !self.attribute_names.iter().any(|n| n == name) {
            return Err(SurveyError::AttributeNotFound(name.to_string()));
        }
        Ok(self.read_attribute(name)?)
    }

    fn line_numbers(&self) -> SurveyResult<Vec<Option<i64>>> {
        Ok(self.read_line_numbers()?)
    }

    fn native_reference_system(&self) -> SurveyResult<ReferenceSystem> {
        Ok(self.reference_system)
    }
}

fn detect_line_layout(file: &netcdf::File) -> NetCdfResult<LineLayout> {
    let line_var = file
        .variable("line")
        .ok_or_else(|| NetCdfError::MissingData("line variable".to_string()))?;
    let on_points = matches!(line_var.dimensions(), [dim] if dim.name() == POINT_DIMENSION);
    if on_points {
        return Ok(LineLayout::PerPoint);
    }
    let has_index = file.variable("line_index").is_some();
    if line_var.dimensions().is_empty() && !has_index {
        return Ok(LineLayout::Single);
    }
    if !has_index {
        return Err(NetCdfError::MissingData(
            "line_index variable for line(line) layout".to_string(),
        ));
    }
    Ok(LineLayout::Indexed)
}

/// Reference system from the `crs` variable.
///
/// Projected coordinates have no default and must name their system.
fn read_reference_system(
    file: &netcdf::File,
    coordinate_variables: (&str, &str),
) -> NetCdfResult<ReferenceSystem> {
    let geographic = coordinate_variables.0 == "longitude";
    let Some(crs) = file.variable("crs") else {
        if geographic {
            debug!(system = %DEFAULT_GEOGRAPHIC_SYSTEM, "No crs variable, using default");
            return Ok(DEFAULT_GEOGRAPHIC_SYSTEM);
        }
        return Err(NetCdfError::MissingData(
            "crs variable for projected coordinates".to_string(),
        ));
    };

    let identifier = ["spatial_ref", "crs_wkt", "epsg_code"]
        .into_iter()
        .find_map(|name| get_string_attr(&crs, name))
        .or_else(|| get_f64_attr(&crs, "epsg_code").map(|code| format!("EPSG:{}", code as u32)))
        .ok_or_else(|| {
            NetCdfError::MissingData("spatial_ref, crs_wkt or epsg_code on crs".to_string())
        })?;

    let system = ReferenceSystem::resolve(&identifier)
        .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
    if system.is_geographic() != geographic {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} coordinates with {} reference system",
            coordinate_variables.0,
            system.name()
        )));
    }
    Ok(system)
}

/// Numeric variables indexed by point, in file order.
fn discover_attributes(file: &netcdf::File, point_count: usize) -> Vec<String> {
    file.variables()
        .filter_map(|var| {
            let name = var.name();
            if RESERVED_VARIABLES.contains(&name.as_str()) {
                return None;
            }
            let readable = match var.dimensions() {
                [dim] if dim.name() == POINT_DIMENSION => {
                    point_count == 0 || var.get_values::<f64, _>((0..1,)).is_ok()
                }
                [dim, _] if dim.name() == POINT_DIMENSION => {
                    point_count == 0 || var.get_values::<f64, _>((0..1, ..)).is_ok()
                }
                _ => return None,
            };
            if !readable {
                debug!(variable = %name, "Skipping non-numeric point variable");
                return None;
            }
            Some(name)
        })
        .collect()
}
