//! Advanced battery monitoring (ABM) charger state
//!
//! ABM-capable units report the charger sub-state through one of two raw
//! representations, depending on device generation:
//!
//! - `PathA`: `UPS.BatterySystem.Charger.Mode` (1 charging, 2 discharging,
//!   3 floating, 4 resting, 6 off)
//! - `PathB`: `UPS.BatterySystem.Charger.Status` (1 charging, 2 floating,
//!   3 resting, 4 discharging, 6 off)
//!
//! Code 5 means "ABM not activated" on both paths and is never published.
//! Whichever representation is observed first after monitoring becomes
//! enabled claims the active path until monitoring leaves `Enabled`.

use crate::convert::{ConvertContext, DynamicConversion};
use crate::session::status::StatusToken;
use std::fmt;

/// Canonical name cleared when the charger status cannot be published
pub const CHARGER_STATUS_VAR: &str = "battery.charger.status";

/// Whether advanced battery monitoring is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Monitoring {
    #[default]
    Unknown,
    Disabled,
    Enabled,
}

/// Raw representation carrying the charger sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePath {
    #[default]
    Unknown,
    /// `Charger.Mode`
    PathA,
    /// `Charger.Status`
    PathB,
}

/// ABM charger sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerStatus {
    Charging,
    Floating,
    Resting,
    Discharging,
    Off,
}

impl ChargerStatus {
    pub fn label(self) -> &'static str {
        match self {
            ChargerStatus::Charging => "charging",
            ChargerStatus::Floating => "floating",
            ChargerStatus::Resting => "resting",
            ChargerStatus::Discharging => "discharging",
            ChargerStatus::Off => "off",
        }
    }

    /// Decode a raw code as reported on `path`. `Unknown` decodes like `PathA`.
    pub fn decode(path: ActivePath, raw: f64) -> Option<Self> {
        let code = raw.round() as i64;
        match (path, code) {
            (_, 1) => Some(ChargerStatus::Charging),
            (_, 6) => Some(ChargerStatus::Off),
            (ActivePath::PathB, 2) => Some(ChargerStatus::Floating),
            (ActivePath::PathB, 3) => Some(ChargerStatus::Resting),
            (ActivePath::PathB, 4) => Some(ChargerStatus::Discharging),
            (_, 2) => Some(ChargerStatus::Discharging),
            (_, 3) => Some(ChargerStatus::Floating),
            (_, 4) => Some(ChargerStatus::Resting),
            _ => None,
        }
    }

    /// Simplified charge indicator; resting and off assert nothing
    pub fn indicator(self) -> Option<StatusToken> {
        match self {
            ChargerStatus::Charging | ChargerStatus::Floating => Some(StatusToken::set("chrg")),
            ChargerStatus::Discharging => Some(StatusToken::set("dischrg")),
            ChargerStatus::Resting | ChargerStatus::Off => None,
        }
    }
}

impl fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Monitoring flag plus the claimed raw representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargerModeState {
    enabled: Monitoring,
    active_path: ActivePath,
}

impl ChargerModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> Monitoring {
        self.enabled
    }

    pub fn active_path(&self) -> ActivePath {
        self.active_path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled == Monitoring::Enabled
    }

    /// Feed the "monitoring enabled" raw value (`ABMEnable`)
    pub fn observe_enabled(&mut self, raw: f64) {
        let next = match raw.round() as i64 {
            0 => Monitoring::Disabled,
            1 => Monitoring::Enabled,
            _ => Monitoring::Unknown,
        };
        if next != self.enabled {
            tracing::info!(from = ?self.enabled, to = ?next, raw, "ABM monitoring changed");
        }
        self.enabled = next;
        if next != Monitoring::Enabled {
            self.active_path = ActivePath::Unknown;
        }
    }

    /// Note that the representation `path` was read from the device. Claims
    /// the slot when monitoring is enabled and nothing has claimed it yet.
    pub fn observe_path(&mut self, path: ActivePath) {
        if !self.is_enabled() {
            self.active_path = ActivePath::Unknown;
            return;
        }
        if self.active_path == ActivePath::Unknown && path != ActivePath::Unknown {
            tracing::debug!(?path, "ABM path claimed");
            self.active_path = path;
        }
    }

    /// Charger status for a raw code read from `source`.
    ///
    /// Returns `None` when monitoring is off, when the code is not a
    /// publishable state, or when `source` is not the claimed path.
    pub fn status_from(&self, source: ActivePath, raw: f64) -> Option<ChargerStatus> {
        if !self.is_enabled() {
            return None;
        }
        let path = match self.active_path {
            ActivePath::Unknown => source,
            claimed if claimed == source => claimed,
            _ => return None,
        };
        ChargerStatus::decode(path, raw)
    }
}

/// `battery.charger.abm.status`: records the monitoring flag, never publishes
#[derive(Debug)]
pub struct AbmEnabled;

impl DynamicConversion for AbmEnabled {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        ctx.session.charger.observe_enabled(raw);
        None
    }
}

/// Path-claiming probe for one raw representation, never publishes
#[derive(Debug)]
pub struct AbmPathProbe(pub ActivePath);

impl DynamicConversion for AbmPathProbe {
    fn forward(&self, _raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        ctx.session.charger.observe_path(self.0);
        None
    }
}

/// `battery.charger.status` read from one raw representation
#[derive(Debug)]
pub struct AbmStatus(pub ActivePath);

impl DynamicConversion for AbmStatus {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        let charger = &ctx.session.charger;
        if !charger.is_enabled() {
            // monitoring was switched off; drop whatever was published before
            ctx.store.delete(CHARGER_STATUS_VAR);
            return None;
        }
        let other_path_claimed =
            charger.active_path() != ActivePath::Unknown && charger.active_path() != self.0;
        if other_path_claimed {
            return None;
        }
        match charger.status_from(self.0, raw) {
            Some(status) => Some(status.label().to_string()),
            None => {
                tracing::debug!(raw, path = ?self.0, "undefined ABM charger code");
                ctx.store.delete(CHARGER_STATUS_VAR);
                None
            }
        }
    }
}

/// CHRG/DISCHRG status token driven by ABM
#[derive(Debug)]
pub struct AbmChargeIndicator(pub ActivePath);

impl DynamicConversion for AbmChargeIndicator {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        ctx.session
            .charger
            .status_from(self.0, raw)
            .and_then(ChargerStatus::indicator)
            .map(|token| token.to_string())
    }
}

/// CHRG/DISCHRG token from the legacy PresentStatus bits. Only authoritative
/// while ABM is not enabled.
#[derive(Debug)]
pub struct LegacyChargeIndicator {
    pub token: &'static str,
}

impl DynamicConversion for LegacyChargeIndicator {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        if ctx.session.charger.is_enabled() {
            return None;
        }
        let token = if raw.round() as i64 == 1 {
            StatusToken::set(self.token)
        } else {
            StatusToken::clear(self.token)
        };
        Some(token.to_string())
    }
}
