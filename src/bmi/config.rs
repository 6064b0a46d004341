use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatumSyncError, Result};

/// Names the special scalar variables are always exposed under.
pub(crate) const CRS_IN: &str = "crs_in";
pub(crate) const CRS_OUT: &str = "crs_out";
pub(crate) const Z_WARN: &str = "z_warn";

/// Configuration of the BMI wrapper, loaded from a YAML file.
///
/// ```yaml
/// crs_input: 4326
/// crs_output: 5703
/// z_warn: true
/// tolerance: 1.0e-6
/// variables:
///   elevation: land_surface__elevation
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatumSyncConfig {
    /// CRS of input values expressed as an EPSG integer (e.g. 4326).
    pub crs_input: u32,
    /// CRS of output values expressed as an EPSG integer (e.g. 5703).
    pub crs_output: u32,
    /// Report warnings about z values not being converted. Turn off when
    /// that is expected, or when running in a batch environment.
    #[serde(default = "default_z_warn")]
    pub z_warn: bool,
    /// Tolerance below which a z value counts as unchanged. Defaults to
    /// [`crate::zcheck::DEFAULT_TOLERANCE`].
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Names under which the coordinate variables are exposed.
    #[serde(default)]
    pub variables: VariableNames,
}

fn default_z_warn() -> bool {
    true
}

impl DatumSyncConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| DatumSyncError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_yaml::from_str(&text).map_err(|source| DatumSyncError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(tolerance) = self.tolerance {
            if tolerance.is_nan() || tolerance <= 0.0 {
                return Err(DatumSyncError::Config(format!(
                    "tolerance must be a positive number, got {tolerance}"
                )));
            }
        }
        self.variables.validate()
    }
}

/// Variable name bindings for the BMI surface. Every field falls back to
/// the conventional name when omitted from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableNames {
    #[serde(default = "default_longitude")]
    pub longitude: String,
    #[serde(default = "default_latitude")]
    pub latitude: String,
    #[serde(default = "default_elevation")]
    pub elevation: String,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        Self {
            longitude: default_longitude(),
            latitude: default_latitude(),
            elevation: default_elevation(),
            output: default_output(),
        }
    }
}

fn default_longitude() -> String {
    "longitude".to_string()
}

fn default_latitude() -> String {
    "latitude".to_string()
}

fn default_elevation() -> String {
    "elevation".to_string()
}

fn default_output() -> String {
    "coordinates__output".to_string()
}

impl VariableNames {
    fn validate(&self) -> Result<()> {
        let names = [
            self.longitude.as_str(),
            self.latitude.as_str(),
            self.elevation.as_str(),
            self.output.as_str(),
        ];

        if let Some(name) = names.iter().find(|name| name.trim().is_empty()) {
            return Err(DatumSyncError::Config(format!(
                "variable name must not be blank, got {name:?}"
            )));
        }

        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(DatumSyncError::Config(format!(
                    "variable name '{name}' is bound more than once"
                )));
            }
            if [CRS_IN, CRS_OUT, Z_WARN].contains(name) {
                return Err(DatumSyncError::Config(format!(
                    "variable name '{name}' is reserved"
                )));
            }
        }

        Ok(())
    }
}
