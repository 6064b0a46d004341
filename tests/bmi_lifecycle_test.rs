use std::fs;

use datum_sync::{BmiDatumSync, DatumSyncError, Phase};
use tempfile::TempDir;

/// Drive the whole BMI lifecycle against a config file on disk, using an
/// identity CRS pair so no transformation grids are required.
#[test]
fn full_lifecycle_over_identity_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bmi_config.yaml");
    fs::write(
        &config_path,
        "crs_input: 4326\ncrs_output: 4326\nz_warn: true\n",
    )
    .unwrap();

    let mut model = BmiDatumSync::new();
    model.initialize(&config_path).unwrap();
    assert_eq!(model.phase(), Phase::Initialized);
    assert_eq!(model.get_value("crs_in").unwrap(), vec![4326.0]);
    assert_eq!(model.get_value("crs_out").unwrap(), vec![4326.0]);

    model.set_value("longitude", &[-79.4]).unwrap();
    model.set_value("latitude", &[43.7]).unwrap();
    model.set_value("elevation", &[5.0]).unwrap();
    model.update().unwrap();

    // identity pair: values pass through, no change expected and none flagged
    let out = model.get_value("coordinates__output").unwrap();
    assert_eq!(out, vec![-79.4, 43.7, 5.0]);
    assert!(!model.z_changed());
    assert_eq!(model.warning(), None);

    model.finalize().unwrap();
    assert!(matches!(
        model.get_value("coordinates__output"),
        Err(DatumSyncError::Lifecycle { .. })
    ));
}

#[test]
fn initialize_surfaces_config_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("nope.yaml");
    let mut model = BmiDatumSync::new();
    assert!(matches!(
        model.initialize(&missing),
        Err(DatumSyncError::ConfigIo { .. })
    ));

    let malformed = temp_dir.path().join("bad.yaml");
    fs::write(&malformed, "crs_input: 4326\n").unwrap();
    let mut model = BmiDatumSync::new();
    assert!(matches!(
        model.initialize(&malformed),
        Err(DatumSyncError::ConfigParse { .. })
    ));

    let bad_tolerance = temp_dir.path().join("tolerance.yaml");
    fs::write(
        &bad_tolerance,
        "crs_input: 4326\ncrs_output: 5703\ntolerance: -1.0\n",
    )
    .unwrap();
    let mut model = BmiDatumSync::new();
    assert!(matches!(
        model.initialize(&bad_tolerance),
        Err(DatumSyncError::Config(_))
    ));
}
