use gdal::config;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

use crate::error::{DatumSyncError, Result};

/// An EPSG-to-EPSG coordinate transformation.
///
/// The production implementation is [`GdalTransform`]; tests substitute
/// deterministic doubles so they run without PROJ grids or network access.
pub trait CrsTransform {
    /// Transform coordinates in place. `z` may be empty for 2D input.
    fn transform(&self, x: &mut [f64], y: &mut [f64], z: &mut [f64]) -> Result<()>;
}

/// Coordinate transformation backed by GDAL/PROJ.
pub struct GdalTransform {
    transform: CoordTransform,
    source_epsg: u32,
    target_epsg: u32,
}

impl GdalTransform {
    /// Build a transformation between two EPSG codes.
    ///
    /// Vertical transformations may need geoid grids that are not part of
    /// the base PROJ installation, so PROJ network fetching is switched on
    /// here. Set the standard `PROJ_NETWORK` environment knobs to override.
    pub fn from_epsg(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        config::set_config_option("PROJ_NETWORK", "ON")?;

        let source = spatial_ref(source_epsg)?;
        let target = spatial_ref(target_epsg)?;
        let transform = CoordTransform::new(&source, &target)?;

        tracing::debug!(
            "created transform EPSG:{} -> EPSG:{}",
            source_epsg,
            target_epsg
        );

        Ok(Self {
            transform,
            source_epsg,
            target_epsg,
        })
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }
}

impl CrsTransform for GdalTransform {
    fn transform(&self, x: &mut [f64], y: &mut [f64], z: &mut [f64]) -> Result<()> {
        self.transform.transform_coords(x, y, z)?;
        Ok(())
    }
}

fn spatial_ref(epsg: u32) -> Result<SpatialRef> {
    let mut srs =
        SpatialRef::from_epsg(epsg).map_err(|source| DatumSyncError::InvalidCrs { epsg, source })?;
    // lon/lat ordering regardless of what the authority defines
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_epsg_code() {
        let result = GdalTransform::from_epsg(4326, 99_999_999);
        assert!(matches!(
            result,
            Err(DatumSyncError::InvalidCrs { epsg: 99_999_999, .. })
        ));
    }

    #[test]
    fn builds_identity_transform() {
        let transform = GdalTransform::from_epsg(4326, 4326).unwrap();
        assert_eq!(transform.source_epsg(), 4326);
        assert_eq!(transform.target_epsg(), 4326);
    }

    #[test]
    fn transforms_horizontal_coordinates() {
        use approx::assert_relative_eq;

        let transform = GdalTransform::from_epsg(4326, 3857).unwrap();

        let mut x = [-79.4];
        let mut y = [0.0];
        transform.transform(&mut x, &mut y, &mut []).unwrap();

        assert_relative_eq!(x[0], -8838767.569, epsilon = 1e-2);
        assert!(y[0].abs() < 1e-6);
    }
}
