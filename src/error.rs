use std::path::PathBuf;

use thiserror::Error;

use crate::bmi::Phase;

pub type Result<T> = std::result::Result<T, DatumSyncError>;

/// Errors surfaced by the datum sync library. Warnings about unconverted
/// z values are not errors; see [`crate::zcheck::ZWarning`].
#[derive(Debug, Error)]
pub enum DatumSyncError {
    #[error("failed to read config file {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("EPSG:{epsg} is not a usable CRS")]
    InvalidCrs {
        epsg: u32,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("coordinate transformation failed")]
    Transform(#[from] gdal::errors::GdalError),

    #[error("coordinate arrays differ in length (x: {x}, y: {y}, z: {z:?})")]
    ShapeMismatch {
        x: usize,
        y: usize,
        z: Option<usize>,
    },

    #[error("variable '{0}' does not exist in input or output variables")]
    UnknownVariable(String),

    #[error("{0} must be set before update")]
    MissingInput(&'static str),

    #[error("{op} called while the model is {phase}")]
    Lifecycle { op: &'static str, phase: Phase },
}
