//! Device classification
//!
//! Maps the (product, model) strings a UPS reports to a coarse
//! [`DeviceFamily`] and a display name. The family gates which optional
//! converters and transfer validators apply to the connected device.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse hardware taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Offline (standby) models
    DefaultOffline,
    /// Offline models with outlet eco control (Protection Station, Ellipse ECO)
    Pegasus,
    /// 3S series, eco control on non-European units
    ThreeS,
    /// Line-interactive and online models
    Default,
    /// Newer Evolution series
    Evolution,
    /// Evolution 650, which reports a fixed 12 V battery
    Evolution650,
    PulsarM,
    /// Eaton 5P / 5PX / 5SC
    Eaton5P,
    /// Eaton 9E / 9SX / 9PX
    Eaton9E,
}

impl DeviceFamily {
    /// Stable identifier used in logs and published as `ups.family`
    pub fn code(self) -> &'static str {
        match self {
            DeviceFamily::DefaultOffline => "MGE_DEFAULT_OFFLINE",
            DeviceFamily::Pegasus => "MGE_PEGASUS",
            DeviceFamily::ThreeS => "MGE_3S",
            DeviceFamily::Default => "MGE_DEFAULT",
            DeviceFamily::Evolution => "MGE_EVOLUTION",
            DeviceFamily::Evolution650 => "MGE_EVOLUTION_650",
            DeviceFamily::PulsarM => "MGE_PULSAR_M",
            DeviceFamily::Eaton5P => "EATON_5P",
            DeviceFamily::Eaton9E => "EATON_9E",
        }
    }

    pub fn is_offline(self) -> bool {
        matches!(
            self,
            DeviceFamily::DefaultOffline | DeviceFamily::Pegasus | DeviceFamily::ThreeS
        )
    }

    /// Series that report `battery.voltage` and `battery.voltage.nominal`
    pub fn reports_battery_voltage(self) -> bool {
        matches!(
            self,
            DeviceFamily::Evolution
                | DeviceFamily::Evolution650
                | DeviceFamily::PulsarM
                | DeviceFamily::Eaton5P
                | DeviceFamily::Eaton9E
        )
    }

    /// Outlet eco control (threshold and yes/no switch)
    pub fn supports_eco_control(self, country: Country) -> bool {
        match self {
            DeviceFamily::Pegasus => true,
            DeviceFamily::ThreeS => country != Country::Europe,
            _ => false,
        }
    }

    /// Automatic bypass and high-efficiency transfer
    pub fn supports_transfer_modes(self) -> bool {
        !self.is_offline()
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Region reported by `UPS.PowerSummary.Country`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Country {
    #[default]
    Unknown,
    Europe,
    Us,
    /// European models that also support 200/208 V
    Europe208,
    Worldwide,
    Australia,
}

impl Country {
    pub fn from_raw(raw: f64) -> Self {
        match raw.round() as i64 {
            0 => Country::Europe,
            1 => Country::Us,
            2 => Country::Europe208,
            3 => Country::Worldwide,
            4 => Country::Australia,
            _ => Country::Unknown,
        }
    }
}

/// One row of the classification table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRule {
    pub product: String,
    pub model: String,
    pub family: DeviceFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ModelRule {
    pub fn new(product: &str, model: &str, family: DeviceFamily, name: Option<&str>) -> Self {
        Self {
            product: product.to_string(),
            model: model.to_string(),
            family,
            name: name.map(str::to_string),
        }
    }
}

/// Result of classifying a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub family: DeviceFamily,
    pub display_name: String,
}

/// Ordered (product, model) lookup; first exact match wins
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ModelRule>,
}

impl Classifier {
    pub fn new(rules: Vec<ModelRule>) -> Self {
        Self { rules }
    }

    /// Built-in table with `extra` rules consulted first
    pub fn with_overrides(extra: &[ModelRule]) -> Self {
        let mut rules = extra.to_vec();
        rules.extend(builtin_rules());
        Self { rules }
    }

    pub fn rules(&self) -> &[ModelRule] {
        &self.rules
    }

    pub fn classify(&self, product: &str, model: &str) -> Classification {
        let hit = self
            .rules
            .iter()
            .find(|rule| rule.product == product && rule.model == model);

        let family = hit.map_or(DeviceFamily::Default, |rule| rule.family);
        let display_name = match hit.and_then(|rule| rule.name.clone()) {
            Some(name) => name,
            None => format!("{} {}", product, model),
        };
        tracing::debug!(product, model, family = %family, name = %display_name, "classified device");
        Classification {
            family,
            display_name,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(builtin_rules())
    }
}

/// Built-in Eaton/MGE classification table
pub fn builtin_rules() -> Vec<ModelRule> {
    use DeviceFamily::*;

    const TABLE: &[(&str, &str, DeviceFamily, Option<&str>)] = &[
        ("ELLIPSE", "300", DefaultOffline, Some("ellipse 300")),
        ("ELLIPSE", "500", DefaultOffline, Some("ellipse 500")),
        ("ELLIPSE", "650", DefaultOffline, Some("ellipse 650")),
        ("ELLIPSE", "800", DefaultOffline, Some("ellipse 800")),
        ("ELLIPSE", "1200", DefaultOffline, Some("ellipse 1200")),
        ("ellipse", "PR500", DefaultOffline, Some("ellipse premium 500")),
        ("ellipse", "PR650", DefaultOffline, Some("ellipse premium 650")),
        ("ellipse", "PR800", DefaultOffline, Some("ellipse premium 800")),
        ("ellipse", "PR1200", DefaultOffline, Some("ellipse premium 1200")),
        ("Ellipse MAX", "600", DefaultOffline, None),
        ("Ellipse MAX", "850", DefaultOffline, None),
        ("Ellipse MAX", "1100", DefaultOffline, None),
        ("Ellipse MAX", "1500", DefaultOffline, None),
        ("PROTECTIONCENTER", "420", DefaultOffline, Some("Protection Center 420")),
        ("PROTECTIONCENTER", "500", DefaultOffline, Some("Protection Center 500")),
        ("PROTECTIONCENTER", "675", DefaultOffline, Some("Protection Center 675")),
        ("Protection Station", "500", Pegasus, None),
        ("Protection Station", "650", Pegasus, None),
        ("Protection Station", "800", Pegasus, None),
        ("Ellipse ECO", "650", Pegasus, None),
        ("Ellipse ECO", "800", Pegasus, None),
        ("Ellipse ECO", "1200", Pegasus, None),
        ("Ellipse ECO", "1600", Pegasus, None),
        ("3S", "450", DefaultOffline, None),
        ("3S", "550", DefaultOffline, None),
        ("3S", "700", ThreeS, None),
        ("3S", "750", ThreeS, None),
        ("Evolution", "500", Default, Some("Pulsar Evolution 500")),
        ("Evolution", "800", Default, Some("Pulsar Evolution 800")),
        ("Evolution", "1100", Default, Some("Pulsar Evolution 1100")),
        ("Evolution", "1500", Default, Some("Pulsar Evolution 1500")),
        ("Evolution", "2200", Default, Some("Pulsar Evolution 2200")),
        ("Evolution", "3000", Default, Some("Pulsar Evolution 3000")),
        ("Evolution", "3000XL", Default, Some("Pulsar Evolution 3000 XL")),
        ("Evolution", "650", Evolution650, None),
        ("Evolution", "850", Evolution, None),
        ("Evolution", "1150", Evolution, None),
        ("Evolution", "S 1250", Evolution, None),
        ("Evolution", "1550", Evolution, None),
        ("Evolution", "S 1750", Evolution, None),
        ("Evolution", "2000", Evolution, None),
        ("Evolution", "S 2500", Evolution, None),
        ("Evolution", "S 3000", Evolution, None),
        ("Eaton 5P", "650", Eaton5P, Some("5P 650")),
        ("Eaton 5P", "850", Eaton5P, Some("5P 850")),
        ("Eaton 5P", "1150", Eaton5P, Some("5P 1150")),
        ("Eaton 5P", "1550", Eaton5P, Some("5P 1550")),
        ("Eaton 5PX", "1500", Eaton5P, None),
        ("Eaton 5PX", "2200", Eaton5P, None),
        ("Eaton 5PX", "3000", Eaton5P, None),
        ("Eaton 5SC", "500", Eaton5P, None),
        ("Eaton 5SC", "750", Eaton5P, None),
        ("Eaton 5SC", "1000", Eaton5P, None),
        ("Eaton 5SC", "1500", Eaton5P, None),
        ("Eaton 5SC", "2200", Eaton5P, None),
        ("Eaton 5SC", "3000", Eaton5P, None),
        // trailing space is part of what the device reports
        ("Ellipse PRO", "1200 ", Eaton5P, Some("Eaton 5S1200")),
        ("Eaton 9E", "1000", Eaton9E, Some("9E1000")),
        ("Eaton 9E", "1000i", Eaton9E, Some("9E1000i")),
        ("Eaton 9E", "2000", Eaton9E, Some("9E2000")),
        ("Eaton 9E", "2000i", Eaton9E, Some("9E2000i")),
        ("Eaton 9E", "3000", Eaton9E, Some("9E3000")),
        ("Eaton 9E", "3000i", Eaton9E, Some("9E3000i")),
        ("Eaton 9E", "3000ixl", Eaton9E, Some("9E3000ixl")),
        // no iProduct string, identified by configured apparent power
        ("unknown", "1000", Eaton9E, Some("9E1000i (presumed)")),
        ("unknown", "2000", Eaton9E, Some("9E2000i (presumed)")),
        ("unknown", "3000", Eaton9E, Some("9E3000i (presumed)")),
        ("Eaton 9SX", "700i", Eaton9E, Some("9SX700i")),
        ("Eaton 9SX", "1000i", Eaton9E, Some("9SX1000i")),
        ("Eaton 9SX", "1500i", Eaton9E, Some("9SX1500i")),
        ("Eaton 9SX", "2000i", Eaton9E, Some("9SX2000i")),
        ("Eaton 9SX", "3000i", Eaton9E, Some("9SX3000i")),
        ("Eaton 9PX", "1500irt2u", Eaton9E, Some("9px1500irt2u")),
        ("Eaton 9PX", "2200irt2u", Eaton9E, Some("9px2200irt2u")),
        ("Eaton 9PX", "3000irt2u", Eaton9E, Some("9px3000irt2u")),
        ("PULSAR M", "2200", PulsarM, None),
        ("PULSAR M", "3000", PulsarM, None),
        ("PULSAR M", "3000 XL", PulsarM, None),
        ("EX", "2200", PulsarM, None),
        ("EX", "3000", PulsarM, None),
        ("PULSAR", "MX4000", Default, Some("Pulsar MX 4000 RT")),
        ("PULSAR", "MX5000", Default, Some("Pulsar MX 5000 RT")),
        ("NOVA AVR", "500", Default, Some("Nova 500 AVR")),
        ("NOVA AVR", "600", Default, Some("Nova 600 AVR")),
        ("NOVA AVR", "1100", Default, Some("Nova 1100 AVR")),
        ("EX", "1000RT", Default, Some("Pulsar EX 1000 RT")),
        ("EX", "1500RT", Default, Some("Pulsar EX 1500 RT")),
        ("EX", "2200RT", Default, Some("Pulsar EX 2200 RT")),
    ];

    TABLE
        .iter()
        .map(|(product, model, family, name)| ModelRule::new(product, model, *family, *name))
        .collect()
}
