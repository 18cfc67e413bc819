//! Bypass and high-efficiency (ECO) transfer validation
//!
//! Decides whether the bypass line is good enough to hand the load over to
//! it, either in automatic bypass or in ECO mode. The decision only looks at
//! values published earlier in the same cycle; nothing is carried over from
//! previous cycles except what the store still holds.

pub mod sequence;

use crate::convert::{ConvertContext, DynamicConversion, InvalidValue};
use serde::{Deserialize, Serialize};

pub const BYPASS_VOLTAGE: &str = "input.bypass.voltage";
pub const BYPASS_FREQUENCY: &str = "input.bypass.frequency";
pub const NOMINAL_OUTPUT_VOLTAGE: &str = "output.voltage.nominal";
pub const NOMINAL_OUTPUT_FREQUENCY: &str = "output.frequency.nominal";
pub const ECO_SWITCHABLE: &str = "input.eco.switchable";
pub const BYPASS_SWITCH_ON: &str = "input.bypass.switch.on";
pub const BYPASS_SWITCH_OFF: &str = "input.bypass.switch.off";
pub const MODE_BUZZWORDS: &str = "ups.mode.buzzwords";

/// Alternate power path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    Bypass,
    Eco,
}

impl TransferMode {
    fn low_threshold_var(self) -> &'static str {
        match self {
            TransferMode::Bypass => "input.transfer.bypass.low",
            TransferMode::Eco => "input.transfer.eco.low",
        }
    }

    fn high_threshold_var(self) -> &'static str {
        match self {
            TransferMode::Bypass => "input.transfer.bypass.high",
            TransferMode::Eco => "input.transfer.eco.high",
        }
    }

    fn frequency_range_var(self) -> &'static str {
        match self {
            TransferMode::Bypass => "input.transfer.frequency.bypass.range",
            TransferMode::Eco => "input.transfer.frequency.eco.range",
        }
    }

    /// Label returned when the mode is admitted
    pub fn active_label(self) -> &'static str {
        match self {
            TransferMode::Bypass => "on",
            TransferMode::Eco => "ECO",
        }
    }

    /// Published switch variable of the mode
    pub fn switch_var(self) -> &'static str {
        match self {
            TransferMode::Bypass => BYPASS_SWITCH_ON,
            TransferMode::Eco => ECO_SWITCHABLE,
        }
    }

    /// Variable reset to its "not switchable" value when the mode is refused
    fn refusal(self) -> (&'static str, &'static str) {
        match self {
            TransferMode::Bypass => (BYPASS_SWITCH_OFF, "off"),
            TransferMode::Eco => (ECO_SWITCHABLE, "normal"),
        }
    }
}

/// Per-mode result of the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Normal,
    Active,
    /// The device reports the switch itself as disabled
    Disabled,
}

/// Transfer states of the cycle in progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferStates {
    bypass: TransferState,
    eco: TransferState,
}

impl TransferStates {
    pub fn get(&self, mode: TransferMode) -> TransferState {
        match mode {
            TransferMode::Bypass => self.bypass,
            TransferMode::Eco => self.eco,
        }
    }

    pub fn set(&mut self, mode: TransferMode, state: TransferState) {
        match mode {
            TransferMode::Bypass => self.bypass = state,
            TransferMode::Eco => self.eco = state,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fallback window, in percent of nominal, used when the device does not
/// publish usable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeDefaults {
    pub voltage_low_pct: f64,
    pub voltage_high_pct: f64,
    pub frequency_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub eco: ModeDefaults,
    pub bypass: ModeDefaults,
}

impl TransferConfig {
    pub fn defaults_for(&self, mode: TransferMode) -> ModeDefaults {
        match mode {
            TransferMode::Bypass => self.bypass,
            TransferMode::Eco => self.eco,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            eco: ModeDefaults {
                voltage_low_pct: 5.0,
                voltage_high_pct: 5.0,
                frequency_pct: 5.0,
            },
            bypass: ModeDefaults {
                voltage_low_pct: 20.0,
                voltage_high_pct: 15.0,
                frequency_pct: 10.0,
            },
        }
    }
}

/// Closed interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub low: f64,
    pub high: f64,
}

impl Window {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn around(nominal: f64, low_pct: f64, high_pct: f64) -> Self {
        Self {
            low: nominal - nominal * low_pct / 100.0,
            high: nominal + nominal * high_pct / 100.0,
        }
    }
}

/// Configured thresholds win when both are positive
pub fn voltage_window(
    nominal: f64,
    low: Option<f64>,
    high: Option<f64>,
    defaults: ModeDefaults,
) -> Window {
    match (low, high) {
        (Some(low), Some(high)) if low > 0.0 && high > 0.0 => Window { low, high },
        _ => Window::around(nominal, defaults.voltage_low_pct, defaults.voltage_high_pct),
    }
}

/// Configured tolerance wins when positive
pub fn frequency_window(nominal: f64, range_pct: Option<f64>, defaults: ModeDefaults) -> Window {
    let pct = match range_pct {
        Some(pct) if pct > 0.0 => pct,
        _ => defaults.frequency_pct,
    };
    Window::around(nominal, pct, pct)
}

/// Why a mode was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    /// Named variables were not published
    MissingInput(Vec<&'static str>),
    OutOfRange,
    /// The device family has no transfer modes
    UnsupportedFamily,
    /// Trigger value other than 1
    NotRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Active(&'static str),
    Suppressed(SuppressReason),
}

impl Evaluation {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Evaluation::Active(label) => Some(*label),
            Evaluation::Suppressed(_) => None,
        }
    }
}

/// Check the bypass line against the window of `mode` and record the result.
///
/// Side effects on the store mirror the device: an admitted ECO mode sets the
/// ECO buzzword; a refused mode resets its switch variable.
pub fn evaluate(mode: TransferMode, trigger: f64, ctx: &mut ConvertContext<'_>) -> Evaluation {
    if trigger.round() as i64 != 1 {
        return Evaluation::Suppressed(SuppressReason::NotRequested);
    }
    if !ctx.session.profile.family.supports_transfer_modes() {
        tracing::debug!(?mode, family = %ctx.session.profile.family, "transfer modes not supported");
        return Evaluation::Suppressed(SuppressReason::UnsupportedFamily);
    }

    let inputs = [
        BYPASS_VOLTAGE,
        BYPASS_FREQUENCY,
        NOMINAL_OUTPUT_VOLTAGE,
        NOMINAL_OUTPUT_FREQUENCY,
    ]
    .map(|name| (name, ctx.published_f64(name)));
    let missing: Vec<&'static str> = inputs
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
    let [
        (_, Some(bypass_voltage)),
        (_, Some(bypass_frequency)),
        (_, Some(nominal_voltage)),
        (_, Some(nominal_frequency)),
    ] = inputs
    else {
        let (var, label) = mode.refusal();
        ctx.store.set(var, label.to_string());
        ctx.session.transfer.set(mode, TransferState::Normal);
        tracing::debug!(?mode, ?missing, "transfer refused, inputs missing");
        return Evaluation::Suppressed(SuppressReason::MissingInput(missing));
    };

    let defaults = ctx.session.transfer_config.defaults_for(mode);
    let voltage = voltage_window(
        nominal_voltage,
        ctx.published_f64(mode.low_threshold_var()),
        ctx.published_f64(mode.high_threshold_var()),
        defaults,
    );
    let frequency = frequency_window(
        nominal_frequency,
        ctx.published_f64(mode.frequency_range_var()),
        defaults,
    );

    let was_active = ctx.store.get(mode.switch_var()).as_deref() == Some(mode.active_label());
    if voltage.contains(bypass_voltage) && frequency.contains(bypass_frequency) {
        if !was_active {
            tracing::info!(?mode, bypass_voltage, bypass_frequency, "bypass line within transfer limits");
        }
        ctx.session.transfer.set(mode, TransferState::Active);
        if mode == TransferMode::Eco {
            ctx.store.set(MODE_BUZZWORDS, "vendor:mge-hid:ECO".to_string());
        }
        return Evaluation::Active(mode.active_label());
    }

    if !voltage.contains(bypass_voltage) {
        tracing::debug!(?mode, bypass_voltage, ?voltage, "bypass voltage outside transfer limits");
    }
    if !frequency.contains(bypass_frequency) {
        tracing::debug!(?mode, bypass_frequency, ?frequency, "bypass frequency outside transfer limits");
    }
    let (var, label) = mode.refusal();
    ctx.store.set(var, label.to_string());
    if mode == TransferMode::Eco {
        ctx.store.set(MODE_BUZZWORDS, "vendor:mge-hid:normal".to_string());
    }
    ctx.session.transfer.set(mode, TransferState::Normal);
    Evaluation::Suppressed(SuppressReason::OutOfRange)
}

/// Row hook of `input.bypass.switch.on`: 0 reports the switch disabled,
/// 1 is only published when the bypass line qualifies
#[derive(Debug)]
pub struct BypassSwitchOn;

impl DynamicConversion for BypassSwitchOn {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        match raw.round() as i64 {
            0 => {
                ctx.session
                    .transfer
                    .set(TransferMode::Bypass, TransferState::Disabled);
                Some("disabled".to_string())
            }
            _ => evaluate(TransferMode::Bypass, raw, ctx)
                .label()
                .map(str::to_string),
        }
    }
}

/// `input.eco.switchable`: 0 normal, 1 ECO when the bypass line qualifies,
/// 2 Energy Saver System
#[derive(Debug)]
pub struct EcoModeReport;

impl DynamicConversion for EcoModeReport {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        match raw.round() as i64 {
            0 => Some("normal".to_string()),
            1 => evaluate(TransferMode::Eco, raw, ctx)
                .label()
                .map(str::to_string),
            2 => {
                ctx.store.set(MODE_BUZZWORDS, "vendor:mge-hid:ESS".to_string());
                Some("ESS".to_string())
            }
            _ => None,
        }
    }

    fn backward(&self, label: &str, _ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        let mode = label.strip_prefix("vendor:mge-hid:").unwrap_or(label);
        match mode {
            "normal" => Ok(0.0),
            "ECO" => Ok(1.0),
            "ESS" => Ok(2.0),
            _ => Err(InvalidValue::unknown_label(label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eco_window_is_five_percent() {
        let defaults = TransferConfig::default().eco;
        let w = voltage_window(230.0, None, None, defaults);
        assert_eq!(w, Window { low: 218.5, high: 241.5 });
    }

    #[test]
    fn non_positive_thresholds_fall_back_to_defaults() {
        let defaults = TransferConfig::default().bypass;
        let w = voltage_window(230.0, Some(0.0), Some(250.0), defaults);
        assert_eq!(w.low, 184.0);
        assert_eq!(w.high, 264.5);
    }

    #[test]
    fn frequency_range_override() {
        let defaults = TransferConfig::default().eco;
        assert_eq!(
            frequency_window(50.0, Some(2.0), defaults),
            Window { low: 49.0, high: 51.0 }
        );
        assert_eq!(
            frequency_window(50.0, Some(-1.0), defaults),
            Window { low: 47.5, high: 52.5 }
        );
    }

    #[test]
    fn window_is_closed() {
        let w = Window { low: 220.0, high: 235.0 };
        assert!(w.contains(220.0));
        assert!(w.contains(235.0));
        assert!(!w.contains(235.1));
    }
}
