use upsbridge::config::Config;
use upsbridge::classifier::{DeviceFamily, ModelRule};
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.device.product = "Eaton 9E".to_string();
    cfg.device.model = "2000i".to_string();
    cfg.device.nominal_output_voltage = Some(230.0);
    cfg.simulator
        .values
        .insert("UPS.PowerSummary.RemainingCapacity".to_string(), 87.0);
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.device.model, "2000i");
    assert_eq!(loaded.device.nominal_output_voltage, Some(230.0));
    assert_eq!(
        loaded.simulator.values.get("UPS.PowerSummary.RemainingCapacity"),
        Some(&87.0)
    );
    assert_eq!(loaded.logging.file, cfg.logging.file);
    assert!(loaded.validate().is_ok());
}

#[test]
fn model_rules_and_transfer_overrides_load_from_yaml() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");
    fs::write(
        &path,
        r#"
device:
  product: Custom
  model: "1"
  model_rules:
    - product: Custom
      model: "1"
      family: pegasus
      name: Lab unit
transfer:
  eco:
    voltage_low_pct: 3
    voltage_high_pct: 4
    frequency_pct: 2
poll:
  interval_ms: 500
"#,
    )
    .unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(
        cfg.device.model_rules,
        vec![ModelRule::new("Custom", "1", DeviceFamily::Pegasus, Some("Lab unit"))]
    );
    assert_eq!(cfg.transfer.eco.voltage_high_pct, 4.0);
    assert_eq!(cfg.transfer.bypass.voltage_low_pct, 20.0);
    assert_eq!(cfg.poll.interval_ms, 500);
    assert_eq!(cfg.poll.full_update_every, 30);
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.device.product.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.device.nominal_output_voltage = Some(-1.0);
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.poll.full_update_every = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.transfer.bypass.voltage_high_pct = 120.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.simulator.values.insert("X".to_string(), f64::NAN);
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, upsbridge::BridgeError::Io { .. }));
}
