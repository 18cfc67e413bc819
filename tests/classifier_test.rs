use upsbridge::classifier::{Classifier, Country, DeviceFamily, ModelRule};

#[test]
fn builtin_table_names_known_models() {
    let classifier = Classifier::default();

    let c = classifier.classify("Eaton 5P", "650");
    assert_eq!(c.family, DeviceFamily::Eaton5P);
    assert_eq!(c.family.code(), "EATON_5P");
    assert_eq!(c.display_name, "5P 650");

    let c = classifier.classify("Evolution", "650");
    assert_eq!(c.family, DeviceFamily::Evolution650);
    assert_eq!(c.display_name, "Evolution 650");

    let c = classifier.classify("Ellipse PRO", "1200 ");
    assert_eq!(c.display_name, "Eaton 5S1200");
}

#[test]
fn unknown_pair_falls_back_to_default_family() {
    let c = Classifier::default().classify("Mystery", "42");
    assert_eq!(c.family, DeviceFamily::Default);
    assert_eq!(c.display_name, "Mystery 42");
}

#[test]
fn overrides_take_precedence() {
    let extra = [ModelRule::new(
        "Eaton 5P",
        "650",
        DeviceFamily::Eaton9E,
        Some("bench unit"),
    )];
    let c = Classifier::with_overrides(&extra).classify("Eaton 5P", "650");
    assert_eq!(c.family, DeviceFamily::Eaton9E);
    assert_eq!(c.display_name, "bench unit");
}

#[test]
fn family_capabilities() {
    assert!(DeviceFamily::DefaultOffline.is_offline());
    assert!(!DeviceFamily::Pegasus.supports_transfer_modes());
    assert!(DeviceFamily::Eaton9E.supports_transfer_modes());
    assert!(DeviceFamily::ThreeS.supports_eco_control(Country::Us));
    assert!(!DeviceFamily::ThreeS.supports_eco_control(Country::Europe));
    assert!(DeviceFamily::Pegasus.supports_eco_control(Country::Europe));
    assert!(!DeviceFamily::Default.reports_battery_voltage());
    assert_eq!(Country::from_raw(2.0), Country::Europe208);
    assert_eq!(Country::from_raw(9.0), Country::Unknown);
}
