//! CLI configuration.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults
//! 2. environment variables (a `.env` file is loaded by `main`)
//! 3. an optional YAML file, with `${VAR}` and `${VAR:-default}` substitution
//! 4. command-line flags, applied by the commands themselves

use anyhow::{Context, Result};
use line_processor::{GriddingMethod, LineProcessorConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved CLI configuration.
#[derive(Debug, Clone, Serialize)]
pub struct CliConfig {
    /// Gridding and spacing defaults
    pub processing: LineProcessorConfig,

    /// Directory for grid output when `--output` is relative
    pub output_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            processing: LineProcessorConfig::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Contents of the YAML configuration file. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub no_data: Option<f32>,
    pub method: Option<String>,
    pub idw_radius: Option<f64>,
    pub idw_power: Option<f64>,
    pub point_step: Option<usize>,
    pub median_spacing_stride: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Environment defaults overlaid with the YAML file, if any.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_env();
        if let Some(path) = path {
            config.apply(load_config_file(path)?)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            processing: LineProcessorConfig::from_env(),
            output_dir: std::env::var("SURVEY_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Overlay the values present in a configuration file.
    pub fn apply(&mut self, file: ConfigFile) -> Result<()> {
        let processing = &mut self.processing;
        if let Some(no_data) = file.no_data {
            processing.no_data = no_data;
        }
        if let Some(step) = file.point_step {
            processing.point_step = step;
        }
        if let Some(stride) = file.median_spacing_stride {
            processing.median_spacing_stride = stride;
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = dir;
        }

        let (current_radius, current_power) = match processing.method {
            GriddingMethod::InverseDistance { radius, power } => (radius, power),
            _ => (None, 2.0),
        };
        let radius = file.idw_radius.or(current_radius);
        let power = file.idw_power.unwrap_or(current_power);

        match file.method {
            Some(name) => {
                processing.method = GriddingMethod::from_name(&name, radius, power)
                    .with_context(|| format!("Unknown gridding method '{}'", name))?;
            }
            None => {
                if let GriddingMethod::InverseDistance { .. } = processing.method {
                    processing.method = GriddingMethod::InverseDistance { radius, power };
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.processing
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
    }

    /// Output path for a file name, relative to `output_dir` unless absolute.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }
}

/// Read and parse a YAML configuration file with environment substitution.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    let expanded = expand_env_vars(&content)?;

    serde_yaml::from_str(&expanded).with_context(|| format!("Failed to parse config from {:?}", path))
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("SURVEY_TEST_VAR", "12.5");
        let result = expand_env_vars("radius: ${SURVEY_TEST_VAR}").unwrap();
        assert_eq!(result, "radius: 12.5");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("SURVEY_UNSET_VAR");
        let result = expand_env_vars("method: ${SURVEY_UNSET_VAR:-mean}").unwrap();
        assert_eq!(result, "method: mean");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("SURVEY_REQUIRED_VAR");
        assert!(expand_env_vars("${SURVEY_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_apply_method_and_idw_parameters() {
        let mut config = CliConfig::default();
        config
            .apply(ConfigFile {
                method: Some("idw".to_string()),
                idw_radius: Some(80.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            config.processing.method,
            GriddingMethod::InverseDistance {
                radius: Some(80.0),
                power: 2.0
            }
        );

        // Power alone updates the existing IDW method
        config
            .apply(ConfigFile {
                idw_power: Some(3.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            config.processing.method,
            GriddingMethod::InverseDistance {
                radius: Some(80.0),
                power: 3.0
            }
        );
    }

    #[test]
    fn test_apply_unknown_method() {
        let mut config = CliConfig::default();
        let result = config.apply(ConfigFile {
            method: Some("kriging".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_output_path() {
        let config = CliConfig {
            output_dir: PathBuf::from("/data/grids"),
            ..Default::default()
        };
        assert_eq!(config.output_path(Path::new("mag.asc")), PathBuf::from("/data/grids/mag.asc"));
        assert_eq!(config.output_path(Path::new("/tmp/mag.asc")), PathBuf::from("/tmp/mag.asc"));
    }
}
