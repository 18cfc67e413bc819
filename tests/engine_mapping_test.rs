use std::fs;
use upsbridge::classifier::DeviceFamily;
use upsbridge::convert::ConverterCatalog;
use upsbridge::engine::{Engine, EntryOutcome, PollKind};
use upsbridge::registry::Registry;
use upsbridge::session::{DeviceProfile, Session};
use upsbridge::store::MemoryStore;
use upsbridge::transport::SimulatedDevice;
use upsbridge::BridgeError;

const MAPPING: &str = r#"
entries:
  - name: battery.runtime
    path: UPS.PowerSummary.RunTimeToEmpty
  - name: battery.runtime
    path: UPS.BatterySystem.Battery.RunTimeToEmpty
  - name: ups.beeper.status
    path: UPS.PowerSummary.AudibleAlarmControl
    converter: beeper
    flags: { writable: true }
  - name: battery.capacity
    path: UPS.BatterySystem.Battery.DesignCapacity
    format: { scaled: { divisor: 3600, precision: 2 } }
    flags: { static: true }
  - kind: status
    path: UPS.PowerSummary.PresentStatus.ACPresent
    converter: online
  - kind: status
    path: UPS.PowerSummary.PresentStatus.Charging
    converter: legacy_charging
  - kind: command
    name: beeper.mute
    path: UPS.PowerSummary.AudibleAlarmControl
    literal: "3"
"#;

fn engine_from_file() -> Engine<SimulatedDevice, MemoryStore> {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("mapping.yaml");
    fs::write(&path, MAPPING).unwrap();
    let registry = Registry::from_yaml_file(&path, &ConverterCatalog::builtin()).unwrap();

    let device = SimulatedDevice::new()
        .with_value("UPS.BatterySystem.Battery.RunTimeToEmpty", 1260.0)
        .with_value("UPS.PowerSummary.AudibleAlarmControl", 2.0)
        .with_value("UPS.BatterySystem.Battery.DesignCapacity", 25_200.0)
        .with_value("UPS.PowerSummary.PresentStatus.ACPresent", 1.0)
        .with_value("UPS.PowerSummary.PresentStatus.Charging", 1.0);
    let session = Session::new(DeviceProfile::new(DeviceFamily::Eaton5P, "5P 650"));
    Engine::new(registry, session, device, MemoryStore::new())
}

fn var<'a>(engine: &'a Engine<SimulatedDevice, MemoryStore>, name: &str) -> Option<&'a str> {
    engine.store().variables().get(name).map(String::as_str)
}

#[test]
fn mapping_file_drives_a_full_poll() {
    let mut engine = engine_from_file();
    let report = engine.init();

    assert_eq!(
        report.outcomes("battery.runtime").unwrap(),
        &[
            EntryOutcome::MissingPath,
            EntryOutcome::Published("1260".to_string()),
        ]
    );
    assert_eq!(var(&engine, "battery.capacity"), Some("7.00"));
    assert_eq!(var(&engine, "ups.beeper.status"), Some("enabled"));
    assert_eq!(var(&engine, "ups.status"), Some("OL CHRG"));
    assert!(engine.store().commands().contains("beeper.mute"));
    assert!(engine.store().is_writable("ups.beeper.status"));

    let report = engine.poll(PollKind::Regular);
    assert_eq!(
        report.outcomes("battery.capacity").unwrap(),
        &[EntryOutcome::Skipped]
    );
}

#[test]
fn writes_and_commands_reach_the_device() {
    let mut engine = engine_from_file();
    engine.init();

    engine.set_variable("ups.beeper.status", "disabled").unwrap();
    assert_eq!(var(&engine, "ups.beeper.status"), Some("disabled"));

    let err = engine.set_variable("ups.beeper.status", "quiet").unwrap_err();
    assert!(matches!(err, BridgeError::InvalidWriteValue { .. }));
    assert_eq!(var(&engine, "ups.beeper.status"), Some("disabled"));

    engine.instant_command("beeper.mute").unwrap();
    assert_eq!(
        engine.device().writes(),
        &[
            ("UPS.PowerSummary.AudibleAlarmControl".to_string(), 1.0),
            ("UPS.PowerSummary.AudibleAlarmControl".to_string(), 3.0),
        ]
    );

    engine.device_mut().set_fail_writes(true);
    assert!(matches!(
        engine.set_variable("ups.beeper.status", "enabled"),
        Err(BridgeError::Transport { .. })
    ));
    assert_eq!(var(&engine, "ups.beeper.status"), Some("disabled"));
}

#[test]
fn broken_mapping_file_is_a_config_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("mapping.yaml");
    fs::write(&path, "entries:\n  - kind: status\n    path: X\n").unwrap();
    let err = Registry::from_yaml_file(&path, &ConverterCatalog::builtin()).unwrap_err();
    assert!(matches!(err, BridgeError::Config { .. }));

    let err = Registry::from_yaml_file(tmp_dir.path().join("absent.yaml"), &ConverterCatalog::builtin())
        .unwrap_err();
    assert!(matches!(err, BridgeError::Config { .. }));
}
