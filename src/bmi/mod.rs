//! BMI composition wrapper for datum sync.
//!
//! Adapts [`DatumSync`](crate::sync::DatumSync) to the Basic Model
//! Interface lifecycle so a model coupling framework can drive it:
//! `initialize` reads the YAML config and builds the transformer,
//! `update` runs one conversion pass over the current input variables,
//! and `finalize` releases the model state. The model has no intrinsic
//! dynamics, so `update` performs exactly one conversion per call.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::path::Path;

use crate::error::{DatumSyncError, Result};
use crate::sync::DatumSync;
use crate::transform::{CrsTransform, GdalTransform};
use crate::zcheck::ZWarning;

mod config;

pub use config::{DatumSyncConfig, VariableNames};

use config::{CRS_IN, CRS_OUT, Z_WARN};

pub const COMPONENT_NAME: &str = "Datum Sync";

/// Lifecycle phase of the BMI model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Updated,
    Finalized,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Updated => write!(f, "updated"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// BMI model wrapping the datum converter.
///
/// All variables are exposed as `f64` arrays per BMI convention,
/// including the scalar `crs_in`, `crs_out` and `z_warn` inputs. The
/// output variable holds the converted coordinates flattened row by row:
/// x values, then y values, then z values when elevation was set.
#[derive(Default)]
pub struct BmiDatumSync {
    phase: Phase,
    config: Option<DatumSyncConfig>,
    syncer: Option<DatumSync>,
    input_names: Vec<String>,
    output_names: Vec<String>,
    values: HashMap<String, Vec<f64>>,
    last_z_changed: bool,
    last_warning: Option<ZWarning>,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Uninitialized
    }
}

impl BmiDatumSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the YAML config, build the GDAL transformer and transition to
    /// the initialized phase.
    pub fn initialize(&mut self, config_file: &Path) -> Result<()> {
        self.expect_phase("initialize", Phase::Uninitialized)?;
        let config = DatumSyncConfig::from_file(config_file)?;
        let transform = GdalTransform::from_epsg(config.crs_input, config.crs_output)?;
        self.apply(config, Box::new(transform));
        Ok(())
    }

    /// Initialize with an already-built config and transformation backend.
    ///
    /// This is the seam for driving the model with a deterministic
    /// transform instead of GDAL.
    pub fn initialize_with(
        &mut self,
        config: DatumSyncConfig,
        transform: Box<dyn CrsTransform>,
    ) -> Result<()> {
        self.expect_phase("initialize", Phase::Uninitialized)?;
        config.validate()?;
        self.apply(config, transform);
        Ok(())
    }

    fn apply(&mut self, config: DatumSyncConfig, transform: Box<dyn CrsTransform>) {
        let mut syncer = DatumSync::with_transform(config.crs_input, config.crs_output, transform);
        if let Some(tolerance) = config.tolerance {
            syncer.set_tolerance(tolerance);
        }
        syncer.set_z_warn(config.z_warn);

        let vars = &config.variables;
        self.input_names = vec![
            vars.longitude.clone(),
            vars.latitude.clone(),
            vars.elevation.clone(),
            CRS_IN.to_string(),
            CRS_OUT.to_string(),
            Z_WARN.to_string(),
        ];
        self.output_names = vec![vars.output.clone()];

        self.values.clear();
        for name in self.input_names.iter().chain(&self.output_names) {
            self.values.insert(name.clone(), Vec::new());
        }
        self.values
            .insert(CRS_IN.to_string(), vec![f64::from(config.crs_input)]);
        self.values
            .insert(CRS_OUT.to_string(), vec![f64::from(config.crs_output)]);
        self.values.insert(
            Z_WARN.to_string(),
            vec![if config.z_warn { 1.0 } else { 0.0 }],
        );

        tracing::info!(
            "initialized datum sync: EPSG:{} -> EPSG:{}",
            config.crs_input,
            config.crs_output
        );

        self.config = Some(config);
        self.syncer = Some(syncer);
        self.last_z_changed = false;
        self.last_warning = None;
        self.phase = Phase::Initialized;
    }

    /// Run one conversion pass over the current input variables and store
    /// the flattened result under the output variable.
    pub fn update(&mut self) -> Result<()> {
        self.expect_active("update")?;
        let (Some(config), Some(syncer)) = (&self.config, &self.syncer) else {
            return Err(DatumSyncError::Lifecycle {
                op: "update",
                phase: self.phase,
            });
        };
        let vars = &config.variables;

        let x = self
            .values
            .get(&vars.longitude)
            .filter(|v| !v.is_empty())
            .ok_or(DatumSyncError::MissingInput("longitude"))?;
        let y = self
            .values
            .get(&vars.latitude)
            .filter(|v| !v.is_empty())
            .ok_or(DatumSyncError::MissingInput("latitude"))?;
        let z = self
            .values
            .get(&vars.elevation)
            .filter(|v| !v.is_empty())
            .map(|v| v.as_slice());

        let conversion = syncer.convert(x, y, z)?;
        let output_name = vars.output.clone();

        let rows = 2 + usize::from(conversion.z.is_some());
        let mut flat = Vec::with_capacity(rows * conversion.x.len());
        flat.extend_from_slice(&conversion.x);
        flat.extend_from_slice(&conversion.y);
        if let Some(z) = &conversion.z {
            flat.extend_from_slice(z);
        }

        self.values.insert(output_name, flat);
        self.last_z_changed = conversion.z_changed;
        self.last_warning = conversion.warning;
        self.phase = Phase::Updated;
        Ok(())
    }

    /// Release the converter and variable state. Every later call on the
    /// model fails with a lifecycle error.
    pub fn finalize(&mut self) -> Result<()> {
        self.expect_active("finalize")?;
        self.syncer = None;
        self.config = None;
        self.values.clear();
        self.input_names.clear();
        self.output_names.clear();
        self.phase = Phase::Finalized;
        Ok(())
    }

    /// Copy a variable's current value.
    pub fn get_value(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.get_value_ref(name)?.to_vec())
    }

    /// Borrow a variable's current value.
    pub fn get_value_ref(&self, name: &str) -> Result<&[f64]> {
        self.expect_active("get_value")?;
        self.values
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| DatumSyncError::UnknownVariable(name.to_string()))
    }

    /// Replace a variable's current value.
    pub fn set_value(&mut self, name: &str, src: &[f64]) -> Result<()> {
        self.expect_active("set_value")?;
        let Some(slot) = self.values.get_mut(name) else {
            return Err(DatumSyncError::UnknownVariable(name.to_string()));
        };
        slot.clear();
        slot.extend_from_slice(src);

        // the warning gate can be toggled between updates; the CRS
        // variables are informational and do not rebuild the transformer
        if name == Z_WARN {
            if let (Some(syncer), Some(first)) = (self.syncer.as_mut(), src.first()) {
                syncer.set_z_warn(*first != 0.0);
            }
        }
        Ok(())
    }

    pub fn get_component_name(&self) -> &'static str {
        COMPONENT_NAME
    }

    pub fn get_input_var_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn get_output_var_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn get_input_item_count(&self) -> usize {
        self.input_names.len()
    }

    pub fn get_output_item_count(&self) -> usize {
        self.output_names.len()
    }

    pub fn get_var_type(&self, name: &str) -> Result<&'static str> {
        self.get_value_ref(name).map(|_| "float64")
    }

    pub fn get_var_itemsize(&self, name: &str) -> Result<usize> {
        self.get_value_ref(name).map(|_| mem::size_of::<f64>())
    }

    pub fn get_var_nbytes(&self, name: &str) -> Result<usize> {
        Ok(self.get_value_ref(name)?.len() * mem::size_of::<f64>())
    }

    /// The model performs a single conversion pass per update and keeps no
    /// clock of its own.
    pub fn get_current_time(&self) -> f64 {
        0.0
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the last update changed any z value beyond the tolerance.
    pub fn z_changed(&self) -> bool {
        self.last_z_changed
    }

    /// Advisory warning produced by the last update, if any.
    pub fn warning(&self) -> Option<ZWarning> {
        self.last_warning
    }

    fn expect_phase(&self, op: &'static str, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DatumSyncError::Lifecycle {
                op,
                phase: self.phase,
            })
        }
    }

    fn expect_active(&self, op: &'static str) -> Result<()> {
        match self.phase {
            Phase::Initialized | Phase::Updated => Ok(()),
            Phase::Uninitialized | Phase::Finalized => Err(DatumSyncError::Lifecycle {
                op,
                phase: self.phase,
            }),
        }
    }
}
