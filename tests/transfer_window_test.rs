use upsbridge::classifier::DeviceFamily;
use upsbridge::convert::ConvertContext;
use upsbridge::session::{DeviceProfile, Session};
use upsbridge::store::{MemoryStore, StateStore};
use upsbridge::transfer::{
    self, Evaluation, MODE_BUZZWORDS, SuppressReason, TransferMode, TransferState,
};

fn published(bypass_voltage: &str) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set(transfer::BYPASS_VOLTAGE, bypass_voltage.to_string());
    store.set(transfer::BYPASS_FREQUENCY, "50.0".to_string());
    store.set(transfer::NOMINAL_OUTPUT_VOLTAGE, "230".to_string());
    store.set(transfer::NOMINAL_OUTPUT_FREQUENCY, "50".to_string());
    store
}

fn session(family: DeviceFamily) -> Session {
    Session::new(DeviceProfile::new(family, "Test UPS"))
}

fn eco(session: &mut Session, store: &mut MemoryStore) -> Evaluation {
    let mut ctx = ConvertContext::new(session, store);
    transfer::evaluate(TransferMode::Eco, 1.0, &mut ctx)
}

#[test]
fn eco_window_defaults_to_five_percent_inclusive() {
    for (voltage, admitted) in [
        ("218.5", true),
        ("241.5", true),
        ("218.4", false),
        ("241.6", false),
    ] {
        let mut session = session(DeviceFamily::Eaton9E);
        let mut store = published(voltage);
        let evaluation = eco(&mut session, &mut store);
        assert_eq!(evaluation.label().is_some(), admitted, "bypass at {} V", voltage);
        if admitted {
            assert_eq!(store.get(MODE_BUZZWORDS).as_deref(), Some("vendor:mge-hid:ECO"));
            assert_eq!(session.transfer.get(TransferMode::Eco), TransferState::Active);
        } else {
            assert_eq!(evaluation, Evaluation::Suppressed(SuppressReason::OutOfRange));
            assert_eq!(store.get(transfer::ECO_SWITCHABLE).as_deref(), Some("normal"));
            assert_eq!(session.transfer.get(TransferMode::Eco), TransferState::Normal);
        }
    }
}

#[test]
fn configured_thresholds_replace_percentages() {
    let mut session = session(DeviceFamily::Eaton9E);
    let mut store = published("236");
    store.set("input.transfer.eco.low", "220".to_string());
    store.set("input.transfer.eco.high", "235".to_string());
    assert_eq!(
        eco(&mut session, &mut store),
        Evaluation::Suppressed(SuppressReason::OutOfRange)
    );

    store.set(transfer::BYPASS_VOLTAGE, "235".to_string());
    assert_eq!(eco(&mut session, &mut store), Evaluation::Active("ECO"));
}

#[test]
fn missing_inputs_refuse_the_mode() {
    let mut session = session(DeviceFamily::Eaton9E);
    let mut store = published("230");
    store.delete(transfer::NOMINAL_OUTPUT_FREQUENCY);
    let mut ctx = ConvertContext::new(&mut session, &mut store);
    assert_eq!(
        transfer::evaluate(TransferMode::Bypass, 1.0, &mut ctx),
        Evaluation::Suppressed(SuppressReason::MissingInput(vec![
            transfer::NOMINAL_OUTPUT_FREQUENCY
        ]))
    );
    assert_eq!(store.get(transfer::BYPASS_SWITCH_OFF).as_deref(), Some("off"));
}

#[test]
fn offline_families_never_transfer() {
    let mut session = session(DeviceFamily::Pegasus);
    let mut store = published("230");
    assert_eq!(
        eco(&mut session, &mut store),
        Evaluation::Suppressed(SuppressReason::UnsupportedFamily)
    );
}

#[test]
fn bypass_window_uses_wider_defaults() {
    // 230 V nominal: bypass admits 184 V to 264.5 V
    let mut session = session(DeviceFamily::Eaton5P);
    let mut store = published("190");
    let mut ctx = ConvertContext::new(&mut session, &mut store);
    assert_eq!(
        transfer::evaluate(TransferMode::Bypass, 1.0, &mut ctx),
        Evaluation::Active("on")
    );
}
