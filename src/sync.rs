use crate::error::{DatumSyncError, Result};
use crate::transform::{CrsTransform, GdalTransform};
use crate::zcheck::{self, ZWarning, DEFAULT_TOLERANCE};

/// Result of one conversion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Option<Vec<f64>>,
    /// Whether any z value moved by more than the tolerance.
    pub z_changed: bool,
    /// Advisory classification when the z change pattern is suspicious.
    pub warning: Option<ZWarning>,
}

/// Converts coordinate triples between two CRS and checks whether the
/// vertical component was actually synchronized.
pub struct DatumSync {
    transform: Box<dyn CrsTransform>,
    crs_input: u32,
    crs_output: u32,
    tolerance: f64,
    z_warn: bool,
}

impl DatumSync {
    /// Build a converter backed by GDAL/PROJ.
    pub fn from_epsg(crs_input: u32, crs_output: u32) -> Result<Self> {
        let transform = GdalTransform::from_epsg(crs_input, crs_output)?;
        Ok(Self::with_transform(
            crs_input,
            crs_output,
            Box::new(transform),
        ))
    }

    /// Build a converter around any transformation backend.
    pub fn with_transform(
        crs_input: u32,
        crs_output: u32,
        transform: Box<dyn CrsTransform>,
    ) -> Self {
        Self {
            transform,
            crs_input,
            crs_output,
            tolerance: DEFAULT_TOLERANCE,
            z_warn: true,
        }
    }

    pub fn crs_input(&self) -> u32 {
        self.crs_input
    }

    pub fn crs_output(&self) -> u32 {
        self.crs_output
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Toggle reporting of z conversion warnings. Turn off when unchanged
    /// z values are expected, e.g. in batch environments.
    pub fn set_z_warn(&mut self, z_warn: bool) {
        self.z_warn = z_warn;
    }

    /// Convert coordinates from the input CRS to the output CRS.
    ///
    /// `z` is optional; an empty slice is treated the same as `None` and
    /// the conversion runs in 2D. When the input and output CRS are the
    /// same, values pass through unchanged and no warning is produced.
    pub fn convert(&self, x: &[f64], y: &[f64], z: Option<&[f64]>) -> Result<Conversion> {
        let z = z.filter(|z| !z.is_empty());

        if x.len() != y.len() || z.is_some_and(|z| z.len() != x.len()) {
            return Err(DatumSyncError::ShapeMismatch {
                x: x.len(),
                y: y.len(),
                z: z.map(<[f64]>::len),
            });
        }

        if self.crs_input == self.crs_output {
            tracing::debug!(
                "input and output CRS are both EPSG:{}, passing values through",
                self.crs_input
            );
            return Ok(Conversion {
                x: x.to_vec(),
                y: y.to_vec(),
                z: z.map(<[f64]>::to_vec),
                z_changed: false,
                warning: None,
            });
        }

        let mut out_x = x.to_vec();
        let mut out_y = y.to_vec();
        let mut out_z = z.map(<[f64]>::to_vec);

        self.transform.transform(
            &mut out_x,
            &mut out_y,
            out_z.as_deref_mut().unwrap_or(&mut []),
        )?;

        let (z_changed, mut warning) = match (z, &out_z) {
            (Some(z_in), Some(z_out)) => zcheck::check(z_in, z_out, self.tolerance),
            _ => (false, None),
        };

        if !self.z_warn {
            warning = None;
        } else if let Some(warning) = warning {
            tracing::warn!(
                "EPSG:{} -> EPSG:{}: {}",
                self.crs_input,
                self.crs_output,
                warning
            );
        }

        Ok(Conversion {
            x: out_x,
            y: out_y,
            z: out_z,
            z_changed,
            warning,
        })
    }
}
