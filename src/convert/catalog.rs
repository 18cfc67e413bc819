//! Named converters
//!
//! Mapping tables loaded from YAML refer to converters by name. The same
//! constructors back the built-in registry, so both describe identical
//! behavior.

use super::eaton::{
    BatteryVoltage, ClockPart, ConverterOnline, CountryCapture, DeviceClock, KelvinToCelsius,
    NominalBatteryVoltage, NominalOutputVoltage, PegasusThreshold, PegasusYesNo,
    RealPowerEstimate,
};
use super::{Converter, LookupTable, TableEntry};
use crate::charger::{
    AbmChargeIndicator, AbmEnabled, AbmPathProbe, AbmStatus, ActivePath, LegacyChargeIndicator,
};
use crate::transfer::{BypassSwitchOn, EcoModeReport};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Table for a status token that is set on 1 and cleared on 0
pub fn status_bit(token: &str) -> Converter {
    let cleared = format!("!{}", token);
    Converter::table(&[(1, token), (0, cleared.as_str())])
}

/// Table for a status token that is set on 0 and cleared on 1
pub fn inverted_status_bit(token: &str) -> Converter {
    let cleared = format!("!{}", token);
    Converter::table(&[(0, token), (1, cleared.as_str())])
}

pub fn yes_no() -> Converter {
    Converter::table(&[(0, "no"), (1, "yes")])
}

pub fn enable_disable() -> Converter {
    Converter::table(&[(0, "disabled"), (1, "enabled")])
}

pub fn on_off() -> Converter {
    Converter::table(&[(0, "off"), (1, "on")])
}

pub fn beeper() -> Converter {
    Converter::table(&[(1, "disabled"), (2, "enabled"), (3, "muted")])
}

pub fn ups_type() -> Converter {
    Converter::table(&[
        (1, "offline / line interactive"),
        (2, "online"),
        (3, "online - unitary/parallel"),
        (4, "online - parallel with hot standy"),
        (5, "online - hot standby redundancy"),
    ])
}

pub fn charger_type() -> Converter {
    Converter::table(&[
        (0, "None"),
        (1, "Extended (CLA)"),
        (2, "Large extension"),
        (3, "Extra large extension (XL)"),
        (4, "ABM"),
        (5, "Constant Charge (CC)"),
    ])
}

/// `input.bypass.switch.on`: both rows go through the bypass validator
pub fn bypass_switch_on() -> Converter {
    let hook: Arc<dyn super::DynamicConversion> = Arc::new(BypassSwitchOn);
    Converter::Table(LookupTable::new(vec![
        TableEntry::with_hook(0, "disabled", hook.clone()),
        TableEntry::with_hook(1, "on", hook),
    ]))
}

pub fn bypass_switch_off() -> Converter {
    Converter::table(&[(0, "disabled"), (1, "off")])
}

/// Registry of converters addressable by name
#[derive(Debug, Clone)]
pub struct ConverterCatalog {
    converters: BTreeMap<String, Converter>,
}

impl ConverterCatalog {
    pub fn empty() -> Self {
        Self {
            converters: BTreeMap::new(),
        }
    }

    /// Every converter the built-in Eaton/MGE table uses
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for token in [
            "online",
            "lowbatt",
            "overload",
            "replacebatt",
            "trim",
            "boost",
            "bypassauto",
            "bypassman",
            "ecomode",
            "fanfail",
            "shutdownimm",
        ] {
            catalog.insert(token, status_bit(token));
        }
        catalog.insert("onbatt", inverted_status_bit("online"));
        catalog.insert("off", inverted_status_bit("off"));
        catalog.insert("nobattery", inverted_status_bit("nobattery"));
        catalog.insert("yes_no", yes_no());
        catalog.insert("enable_disable", enable_disable());
        catalog.insert("on_off", on_off());
        catalog.insert("beeper", beeper());
        catalog.insert("ups_type", ups_type());
        catalog.insert("charger_type", charger_type());
        catalog.insert("bypass_switch_on", bypass_switch_on());
        catalog.insert("bypass_switch_off", bypass_switch_off());
        catalog.insert("eco_mode", Converter::dynamic(EcoModeReport));

        catalog.insert("abm_enabled", Converter::dynamic(AbmEnabled));
        catalog.insert("abm_probe_mode", Converter::dynamic(AbmPathProbe(ActivePath::PathA)));
        catalog.insert("abm_probe_status", Converter::dynamic(AbmPathProbe(ActivePath::PathB)));
        catalog.insert("abm_status_mode", Converter::dynamic(AbmStatus(ActivePath::PathA)));
        catalog.insert("abm_status_status", Converter::dynamic(AbmStatus(ActivePath::PathB)));
        catalog.insert(
            "abm_indicator_mode",
            Converter::dynamic(AbmChargeIndicator(ActivePath::PathA)),
        );
        catalog.insert(
            "abm_indicator_status",
            Converter::dynamic(AbmChargeIndicator(ActivePath::PathB)),
        );
        catalog.insert(
            "legacy_charging",
            Converter::dynamic(LegacyChargeIndicator { token: "chrg" }),
        );
        catalog.insert(
            "legacy_discharging",
            Converter::dynamic(LegacyChargeIndicator { token: "dischrg" }),
        );

        catalog.insert("country", Converter::dynamic(CountryCapture));
        catalog.insert("date", Converter::dynamic(DeviceClock(ClockPart::Date)));
        catalog.insert("time", Converter::dynamic(DeviceClock(ClockPart::Time)));
        catalog.insert("battery_voltage", Converter::dynamic(BatteryVoltage));
        catalog.insert(
            "battery_voltage_nominal",
            Converter::dynamic(NominalBatteryVoltage),
        );
        catalog.insert(
            "output_voltage_nominal",
            Converter::dynamic(NominalOutputVoltage),
        );
        catalog.insert("pegasus_threshold", Converter::dynamic(PegasusThreshold));
        catalog.insert("pegasus_yes_no", Converter::dynamic(PegasusYesNo));
        catalog.insert("realpower_estimate", Converter::dynamic(RealPowerEstimate));
        catalog.insert("kelvin_celsius", Converter::dynamic(KelvinToCelsius));
        catalog.insert("converter_online", Converter::dynamic(ConverterOnline));
        catalog
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, converter: Converter) {
        self.converters.insert(name.into(), converter);
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.converters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }
}

impl Default for ConverterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
