//! Composite bypass/ECO switching
//!
//! Entering ECO through automatic bypass is two device writes: first the
//! bypass switch, then the ECO switch, each gated on the published state of
//! the other. The sequence is not transactional. If the second half is
//! refused, the first half stays applied.

use super::{
    BYPASS_SWITCH_OFF, BYPASS_SWITCH_ON, ECO_SWITCHABLE, Evaluation, MODE_BUZZWORDS,
    SuppressReason, TransferMode,
};
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Which way the composite command goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceDirection {
    /// Bypass on, then ECO
    Enter,
    /// ECO off, then bypass off
    Exit,
}

/// Operations the sequence needs from whoever owns the device
pub trait ModeActuator {
    /// Currently published value of `name`
    fn published(&self, name: &str) -> Option<String>;

    /// Run the transfer window check for `mode`
    fn evaluate(&mut self, mode: TransferMode) -> Evaluation;

    /// Write `label` to `name` through the regular write path
    fn apply(&mut self, name: &str, label: &str) -> Result<()>;

    /// Publish without touching the device
    fn publish(&mut self, name: &str, value: &str);
}

/// Run the composite command. Returns the label of the final bypass state.
pub fn run(direction: SequenceDirection, actuator: &mut dyn ModeActuator) -> Result<&'static str> {
    match direction {
        SequenceDirection::Enter => enter(actuator),
        SequenceDirection::Exit => exit(actuator),
    }
}

fn require(actuator: &dyn ModeActuator, name: &str, expected: &str) -> Result<()> {
    match actuator.published(name) {
        Some(value) if value == expected => Ok(()),
        Some(value) => Err(BridgeError::precondition(format!(
            "{} is '{}', expected '{}'",
            name, value, expected
        ))),
        None => Err(BridgeError::missing_data(name)),
    }
}

fn admit(actuator: &mut dyn ModeActuator, mode: TransferMode) -> Result<()> {
    match actuator.evaluate(mode) {
        Evaluation::Active(_) => Ok(()),
        Evaluation::Suppressed(SuppressReason::MissingInput(names)) => {
            Err(BridgeError::missing_data(names.join(", ")))
        }
        Evaluation::Suppressed(reason) => Err(BridgeError::precondition(format!(
            "{:?} transfer refused: {:?}",
            mode, reason
        ))),
    }
}

fn enter(actuator: &mut dyn ModeActuator) -> Result<&'static str> {
    require(actuator, BYPASS_SWITCH_ON, "disabled")?;
    admit(actuator, TransferMode::Bypass)?;
    actuator.apply(BYPASS_SWITCH_ON, TransferMode::Bypass.active_label())?;
    tracing::info!("automatic bypass engaged");

    require(actuator, ECO_SWITCHABLE, "normal")?;
    admit(actuator, TransferMode::Eco)?;
    actuator.apply(ECO_SWITCHABLE, TransferMode::Eco.active_label())?;
    tracing::info!("ECO mode engaged after bypass");
    Ok("on")
}

fn exit(actuator: &mut dyn ModeActuator) -> Result<&'static str> {
    require(actuator, ECO_SWITCHABLE, TransferMode::Eco.active_label())?;
    actuator.apply(ECO_SWITCHABLE, "normal")?;
    actuator.publish(MODE_BUZZWORDS, "vendor:mge-hid:normal");
    tracing::info!("ECO mode released");

    require(actuator, BYPASS_SWITCH_OFF, "disabled")?;
    actuator.apply(BYPASS_SWITCH_OFF, "off")?;
    tracing::info!("automatic bypass released");
    Ok("off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeActuator {
        published: BTreeMap<String, String>,
        admit: Vec<TransferMode>,
        applied: Vec<(String, String)>,
    }

    impl ModeActuator for FakeActuator {
        fn published(&self, name: &str) -> Option<String> {
            self.published.get(name).cloned()
        }

        fn evaluate(&mut self, mode: TransferMode) -> Evaluation {
            if self.admit.contains(&mode) {
                Evaluation::Active(mode.active_label())
            } else {
                Evaluation::Suppressed(SuppressReason::OutOfRange)
            }
        }

        fn apply(&mut self, name: &str, label: &str) -> Result<()> {
            self.applied.push((name.to_string(), label.to_string()));
            self.published.insert(name.to_string(), label.to_string());
            Ok(())
        }

        fn publish(&mut self, name: &str, value: &str) {
            self.published.insert(name.to_string(), value.to_string());
        }
    }

    fn actuator(pairs: &[(&str, &str)], admit: &[TransferMode]) -> FakeActuator {
        FakeActuator {
            published: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            admit: admit.to_vec(),
            applied: Vec::new(),
        }
    }

    #[test]
    fn enter_switches_bypass_then_eco() {
        let mut act = actuator(
            &[(BYPASS_SWITCH_ON, "disabled"), (ECO_SWITCHABLE, "normal")],
            &[TransferMode::Bypass, TransferMode::Eco],
        );
        assert_eq!(run(SequenceDirection::Enter, &mut act).unwrap(), "on");
        assert_eq!(
            act.applied,
            vec![
                (BYPASS_SWITCH_ON.to_string(), "on".to_string()),
                (ECO_SWITCHABLE.to_string(), "ECO".to_string()),
            ]
        );
    }

    #[test]
    fn enter_aborts_when_bypass_already_pending() {
        let mut act = actuator(&[(BYPASS_SWITCH_ON, "on")], &[TransferMode::Bypass]);
        let err = run(SequenceDirection::Enter, &mut act).unwrap_err();
        assert!(matches!(err, BridgeError::PreconditionNotMet { .. }));
        assert!(act.applied.is_empty());
    }

    #[test]
    fn refused_eco_leaves_bypass_applied() {
        let mut act = actuator(
            &[(BYPASS_SWITCH_ON, "disabled"), (ECO_SWITCHABLE, "normal")],
            &[TransferMode::Bypass],
        );
        assert!(run(SequenceDirection::Enter, &mut act).is_err());
        assert_eq!(act.applied.len(), 1);
        assert_eq!(act.published(BYPASS_SWITCH_ON).as_deref(), Some("on"));
    }

    #[test]
    fn exit_releases_eco_first() {
        let mut act = actuator(
            &[(ECO_SWITCHABLE, "ECO"), (BYPASS_SWITCH_OFF, "disabled")],
            &[],
        );
        assert_eq!(run(SequenceDirection::Exit, &mut act).unwrap(), "off");
        assert_eq!(act.applied[0].0, ECO_SWITCHABLE);
        assert_eq!(act.applied[1], (BYPASS_SWITCH_OFF.to_string(), "off".to_string()));
        assert_eq!(
            act.published(MODE_BUZZWORDS).as_deref(),
            Some("vendor:mge-hid:normal")
        );
    }

    #[test]
    fn missing_switch_state_is_missing_data() {
        let mut act = actuator(&[], &[]);
        let err = run(SequenceDirection::Exit, &mut act).unwrap_err();
        assert!(matches!(err, BridgeError::MissingData { .. }));
    }
}
