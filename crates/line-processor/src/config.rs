//! Configuration for line processing and gridding.

use serde::{Deserialize, Serialize};

use crate::gridding::GriddingMethod;

/// Default stride used when estimating sample spacing.
pub const DEFAULT_MEDIAN_SPACING_STRIDE: usize = 10;

/// Defaults applied to gridding requests and spacing estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineProcessorConfig {
    /// Value written to empty cells.
    pub no_data: f32,

    /// Aggregation method for grid cells.
    pub method: GriddingMethod,

    /// Use every k-th point when gridding.
    pub point_step: usize,

    /// Point stride for median sample spacing.
    pub median_spacing_stride: usize,
}

impl Default for LineProcessorConfig {
    fn default() -> Self {
        Self {
            no_data: f32::NAN,
            method: GriddingMethod::Nearest,
            point_step: 1,
            median_spacing_stride: DEFAULT_MEDIAN_SPACING_STRIDE,
        }
    }
}

impl LineProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("GRID_NO_DATA") {
            if let Ok(no_data) = val.parse() {
                config.no_data = no_data;
            }
        }

        let idw_radius = lookup("GRID_IDW_RADIUS").and_then(|v| v.parse().ok());
        let idw_power = lookup("GRID_IDW_POWER")
            .and_then(|v| v.parse().ok())
            .unwrap_or(2.0);
        if let Some(val) = lookup("GRID_METHOD") {
            if let Some(method) = GriddingMethod::from_name(&val, idw_radius, idw_power) {
                config.method = method;
            }
        }

        if let Some(val) = lookup("GRID_POINT_STEP") {
            if let Ok(step) = val.parse() {
                config.point_step = step;
            }
        }

        if let Some(val) = lookup("MEDIAN_SPACING_STRIDE") {
            if let Ok(stride) = val.parse() {
                config.median_spacing_stride = stride;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.point_step == 0 {
            return Err("point_step must be > 0".to_string());
        }

        if self.median_spacing_stride == 0 {
            return Err("median_spacing_stride must be > 0".to_string());
        }

        if let GriddingMethod::InverseDistance { radius, power } = self.method {
            if radius.is_some_and(|r| !(r.is_finite() && r > 0.0)) {
                return Err("IDW radius must be a positive number".to_string());
            }
            if !(power.is_finite() && power >= 0.0) {
                return Err("IDW power must be >= 0".to_string());
            }
        }

        Ok(())
    }
}
