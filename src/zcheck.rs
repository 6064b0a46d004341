//! Detection of z values left unchanged by a CRS transformation.
//!
//! A transformation between CRS without a vertical element passes z
//! through untouched, or only rescales it between meters and feet. Both
//! cases usually indicate a misconfigured transform, so they are
//! classified here and reported to the caller as advisory warnings.

use std::fmt;

pub const FT_TO_M: f64 = 0.3048;
pub const M_TO_FT: f64 = 3.28084;

/// Default tolerance below which a z value counts as unchanged.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// The meters/feet heuristic compares values at two decimals.
const UNIT_TOLERANCE: f64 = 5e-3;

/// Advisory classification of a suspicious z conversion. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZWarning {
    /// z values were numerically unchanged despite a requested CRS change.
    Unchanged,
    /// z values changed only by a meters/feet scale factor.
    UnitConversionOnly,
}

impl fmt::Display for ZWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(
                f,
                "Z values were not altered. This may be because input and output CRS do not have vertical element."
            ),
            Self::UnitConversionOnly => write!(
                f,
                "Z values were converted between meters and feet but were not altered. This may be because input and output CRS do not have vertical element."
            ),
        }
    }
}

/// True when any z/z' pair differs by more than `tolerance`.
pub fn z_changed(z: &[f64], z_out: &[f64], tolerance: f64) -> bool {
    z.iter().zip(z_out).any(|(a, b)| (a - b).abs() > tolerance)
}

/// True when every z' matches z scaled by the feet/meter factor.
pub fn unit_conversion_only(z: &[f64], z_out: &[f64]) -> bool {
    if z.is_empty() {
        return false;
    }

    let scaled = |factor: f64| {
        z.iter()
            .zip(z_out)
            .all(|(a, b)| (a * factor - b).abs() <= UNIT_TOLERANCE)
    };

    scaled(FT_TO_M) || scaled(M_TO_FT)
}

/// Compare z values before and after a transformation.
///
/// Returns whether z changed at all, plus the warning classification
/// when the change pattern looks like a missing vertical element.
pub fn check(z: &[f64], z_out: &[f64], tolerance: f64) -> (bool, Option<ZWarning>) {
    if !z_changed(z, z_out, tolerance) {
        return (false, Some(ZWarning::Unchanged));
    }

    if unit_conversion_only(z, z_out) {
        return (true, Some(ZWarning::UnitConversionOnly));
    }

    (true, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_values_within_tolerance() {
        let z = vec![10.0, 20.0, 30.0];
        let z_out = vec![10.0, 20.0 + 1e-9, 30.0 - 1e-9];

        assert!(!z_changed(&z, &z_out, DEFAULT_TOLERANCE));
        assert_eq!(
            check(&z, &z_out, DEFAULT_TOLERANCE),
            (false, Some(ZWarning::Unchanged))
        );
    }

    #[test]
    fn single_shifted_value_counts_as_changed() {
        let z = vec![10.0, 20.0];
        let z_out = vec![10.0, 20.5];

        assert!(z_changed(&z, &z_out, DEFAULT_TOLERANCE));
        assert_eq!(check(&z, &z_out, DEFAULT_TOLERANCE), (true, None));
    }

    #[test]
    fn tolerance_is_configurable() {
        let z = vec![10.0];
        let z_out = vec![10.4];

        assert!(z_changed(&z, &z_out, DEFAULT_TOLERANCE));
        assert!(!z_changed(&z, &z_out, 0.5));
    }

    #[test]
    fn feet_to_meters_is_unit_conversion_only() {
        let z = vec![100.0, 250.0];
        let z_out: Vec<f64> = z.iter().map(|v| v * FT_TO_M).collect();

        assert!(unit_conversion_only(&z, &z_out));
        assert_eq!(
            check(&z, &z_out, DEFAULT_TOLERANCE),
            (true, Some(ZWarning::UnitConversionOnly))
        );
    }

    #[test]
    fn meters_to_feet_is_unit_conversion_only() {
        let z = vec![30.0, 45.7];
        let z_out: Vec<f64> = z.iter().map(|v| v * M_TO_FT).collect();

        assert!(unit_conversion_only(&z, &z_out));
        assert_eq!(
            check(&z, &z_out, DEFAULT_TOLERANCE),
            (true, Some(ZWarning::UnitConversionOnly))
        );
    }

    #[test]
    fn geoid_shift_is_not_unit_conversion() {
        // values from a 4326 -> 5703 style geoid offset
        let z = vec![10.0, 20.0];
        let z_out = vec![-23.6, -13.7];

        assert!(!unit_conversion_only(&z, &z_out));
        assert_eq!(check(&z, &z_out, DEFAULT_TOLERANCE), (true, None));
    }

    #[test]
    fn empty_arrays_do_not_warn_about_units() {
        assert!(!unit_conversion_only(&[], &[]));
        assert!(!z_changed(&[], &[], DEFAULT_TOLERANCE));
    }
}
