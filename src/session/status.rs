//! Aggregate `ups.status` flags
//!
//! Status entries publish a token (`online`, `!online`, `chrg`, ...) instead
//! of a variable. Tokens accumulate into [`StatusFlags`] for the duration of
//! one poll cycle and are rendered into the space-separated `ups.status`
//! value at the end of it.

use std::fmt;

/// Canonical name the aggregated flags are published under
pub const UPS_STATUS_VAR: &str = "ups.status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Online,
    Charging,
    Discharging,
    LowBattery,
    Overload,
    ReplaceBattery,
    Trim,
    Boost,
    Off,
    BypassAuto,
    BypassManual,
    EcoMode,
    FanFailure,
    NoBattery,
    ShutdownImminent,
}

impl StatusFlag {
    const ALL: [StatusFlag; 15] = [
        StatusFlag::Online,
        StatusFlag::Charging,
        StatusFlag::Discharging,
        StatusFlag::LowBattery,
        StatusFlag::Overload,
        StatusFlag::ReplaceBattery,
        StatusFlag::Trim,
        StatusFlag::Boost,
        StatusFlag::Off,
        StatusFlag::BypassAuto,
        StatusFlag::BypassManual,
        StatusFlag::EcoMode,
        StatusFlag::FanFailure,
        StatusFlag::NoBattery,
        StatusFlag::ShutdownImminent,
    ];

    pub fn token(self) -> &'static str {
        match self {
            StatusFlag::Online => "online",
            StatusFlag::Charging => "chrg",
            StatusFlag::Discharging => "dischrg",
            StatusFlag::LowBattery => "lowbatt",
            StatusFlag::Overload => "overload",
            StatusFlag::ReplaceBattery => "replacebatt",
            StatusFlag::Trim => "trim",
            StatusFlag::Boost => "boost",
            StatusFlag::Off => "off",
            StatusFlag::BypassAuto => "bypassauto",
            StatusFlag::BypassManual => "bypassman",
            StatusFlag::EcoMode => "ecomode",
            StatusFlag::FanFailure => "fanfail",
            StatusFlag::NoBattery => "nobattery",
            StatusFlag::ShutdownImminent => "shutdownimm",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.token() == token)
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A status token as produced by a converter: `name` sets, `!name` clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusToken {
    name: &'static str,
    set: bool,
}

impl StatusToken {
    pub const fn set(name: &'static str) -> Self {
        Self { name, set: true }
    }

    pub const fn clear(name: &'static str) -> Self {
        Self { name, set: false }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.set {
            f.write_str(self.name)
        } else {
            write!(f, "!{}", self.name)
        }
    }
}

/// Flags accumulated during one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFlags {
    bits: u16,
    resolved: bool,
}

impl StatusFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a converter label. Unknown tokens are ignored and return `false`.
    pub fn apply(&mut self, label: &str) -> bool {
        let (name, set) = match label.strip_prefix('!') {
            Some(rest) => (rest, false),
            None => (label, true),
        };
        let Some(flag) = StatusFlag::from_token(name.trim()) else {
            return false;
        };
        if set {
            self.bits |= flag.bit();
        } else {
            self.bits &= !flag.bit();
        }
        self.resolved = true;
        true
    }

    pub fn contains(&self, flag: StatusFlag) -> bool {
        self.bits & flag.bit() != 0
    }

    /// Whether any status entry resolved this cycle
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// `ups.status` value, e.g. `OL CHRG`
    pub fn render(&self) -> String {
        let mut words: Vec<&str> = Vec::new();
        if self.contains(StatusFlag::Off) {
            words.push("OFF");
        }
        words.push(if self.contains(StatusFlag::Online) {
            "OL"
        } else {
            "OB"
        });
        if self.contains(StatusFlag::BypassAuto) || self.contains(StatusFlag::BypassManual) {
            words.push("BYPASS");
        }
        let tail = [
            (StatusFlag::EcoMode, "ECO"),
            (StatusFlag::LowBattery, "LB"),
            (StatusFlag::ReplaceBattery, "RB"),
            (StatusFlag::Overload, "OVER"),
            (StatusFlag::Trim, "TRIM"),
            (StatusFlag::Boost, "BOOST"),
            (StatusFlag::Charging, "CHRG"),
            (StatusFlag::Discharging, "DISCHRG"),
            (StatusFlag::FanFailure, "FANFAIL"),
            (StatusFlag::NoBattery, "NOBATT"),
            (StatusFlag::ShutdownImminent, "FSD"),
        ];
        words.extend(
            tail.iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, word)| *word),
        );
        words.join(" ")
    }
}
