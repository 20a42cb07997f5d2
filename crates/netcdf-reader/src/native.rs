//! Low-level helpers over the native netcdf library.
//!
//! The netcdf crate wraps libnetcdf/HDF5. Optional attributes are probed
//! by name before reading so HDF5 never reports a missing attribute.

use std::sync::Once;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Only needs to be called once per process, but is safe to call multiple
/// times. Call it before any HDF5/NetCDF operation.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Check if a variable has an attribute with the given name.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Numeric attribute as f64.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Text attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Packing and missing-value conventions of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Packing {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl Packing {
    pub fn of(var: &netcdf::Variable) -> Self {
        Self {
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
        }
    }

    /// Whether a raw value marks missing data.
    pub fn is_missing(&self, raw: f64) -> bool {
        raw.is_nan() || Some(raw) == self.fill_value || Some(raw) == self.missing_value
    }

    /// Unpack a raw value; missing values become NaN.
    pub fn unpack(&self, raw: f64) -> f64 {
        if self.is_missing(raw) {
            f64::NAN
        } else {
            raw * self.scale_factor + self.add_offset
        }
    }
}

/// Read a whole variable as unpacked f64 values.
pub(crate) fn read_unpacked(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let raw: Vec<f64> = var.get_values(..).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e))
    })?;
    let packing = Packing::of(var);
    Ok(raw.into_iter().map(|v| packing.unpack(v)).collect())
}

/// Read a whole integer variable; missing values become `None`.
pub(crate) fn read_integers(var: &netcdf::Variable) -> NetCdfResult<Vec<Option<i64>>> {
    let raw: Vec<i64> = var.get_values(..).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to read {}: {}", var.name(), e))
    })?;
    let packing = Packing::of(var);
    Ok(raw
        .into_iter()
        .map(|v| (!packing.is_missing(v as f64)).then_some(v))
        .collect())
}
