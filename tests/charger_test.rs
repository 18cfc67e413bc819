use upsbridge::charger::{ActivePath, ChargerModeState, ChargerStatus, Monitoring};

#[test]
fn enable_disable_enable_resets_the_claimed_path() {
    let mut state = ChargerModeState::new();
    assert_eq!(state.enabled(), Monitoring::Unknown);

    state.observe_enabled(1.0);
    state.observe_path(ActivePath::PathB);
    assert_eq!(state.active_path(), ActivePath::PathB);
    assert_eq!(
        state.status_from(ActivePath::PathB, 2.0),
        Some(ChargerStatus::Floating)
    );
    assert_eq!(state.status_from(ActivePath::PathA, 1.0), None);

    state.observe_enabled(0.0);
    assert_eq!(state.enabled(), Monitoring::Disabled);
    assert_eq!(state.active_path(), ActivePath::Unknown);
    assert_eq!(state.status_from(ActivePath::PathB, 1.0), None);

    state.observe_enabled(1.0);
    state.observe_path(ActivePath::PathA);
    assert_eq!(state.active_path(), ActivePath::PathA);
    assert_eq!(
        state.status_from(ActivePath::PathA, 2.0),
        Some(ChargerStatus::Discharging)
    );
}

#[test]
fn first_claim_wins() {
    let mut state = ChargerModeState::new();
    state.observe_enabled(1.0);
    state.observe_path(ActivePath::PathA);
    state.observe_path(ActivePath::PathB);
    assert_eq!(state.active_path(), ActivePath::PathA);
}

#[test]
fn path_codes_decode_differently() {
    let a = |raw| ChargerStatus::decode(ActivePath::PathA, raw);
    let b = |raw| ChargerStatus::decode(ActivePath::PathB, raw);
    assert_eq!(a(1.0), Some(ChargerStatus::Charging));
    assert_eq!(b(1.0), Some(ChargerStatus::Charging));
    assert_eq!(a(2.0), Some(ChargerStatus::Discharging));
    assert_eq!(b(2.0), Some(ChargerStatus::Floating));
    assert_eq!(a(4.0), Some(ChargerStatus::Resting));
    assert_eq!(b(4.0), Some(ChargerStatus::Discharging));
    assert_eq!(a(6.0), Some(ChargerStatus::Off));
    assert_eq!(a(5.0), None);
    assert_eq!(ChargerStatus::Floating.to_string(), "floating");
    assert!(ChargerStatus::Resting.indicator().is_none());
}
