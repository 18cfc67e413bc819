//! Per-connection session context
//!
//! Everything converters and validators are allowed to remember lives in
//! [`Session`]: the resolved device profile, the ABM charger state, the
//! transfer states and the status flags of the cycle in progress. The
//! engine owns one session per connection and lends it to every conversion.

pub mod status;

use crate::charger::ChargerModeState;
use crate::classifier::{Classification, Country, DeviceFamily};
use crate::transfer::{TransferConfig, TransferStates};
use status::StatusFlags;

/// Device identity resolved at connection time
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub family: DeviceFamily,
    pub display_name: String,
    country: Country,
    country_captured: bool,
    nominal_output_voltage: Option<f64>,
}

impl DeviceProfile {
    pub fn new(family: DeviceFamily, display_name: impl Into<String>) -> Self {
        Self {
            family,
            display_name: display_name.into(),
            country: Country::Unknown,
            country_captured: false,
            nominal_output_voltage: None,
        }
    }

    pub fn from_classification(classification: Classification) -> Self {
        Self::new(classification.family, classification.display_name)
    }

    /// Pin the nominal output voltage class up front (from configuration)
    pub fn with_nominal_output_voltage(mut self, volts: Option<f64>) -> Self {
        self.nominal_output_voltage = volts;
        self
    }

    pub fn country(&self) -> Country {
        self.country
    }

    /// Record the country. Only the first capture sticks; returns whether
    /// this call stored it.
    pub fn capture_country(&mut self, country: Country) -> bool {
        if self.country_captured {
            return false;
        }
        self.country = country;
        self.country_captured = true;
        true
    }

    pub fn nominal_output_voltage(&self) -> Option<f64> {
        self.nominal_output_voltage
    }

    /// First-seen nominal output voltage; later observations do not move it
    pub fn remember_nominal_output_voltage(&mut self, volts: f64) -> f64 {
        *self.nominal_output_voltage.get_or_insert(volts)
    }
}

/// Mutable state shared by all conversions of one connection
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: DeviceProfile,
    pub charger: ChargerModeState,
    pub transfer: TransferStates,
    pub status: StatusFlags,
    pub transfer_config: TransferConfig,
}

impl Session {
    pub fn new(profile: DeviceProfile) -> Self {
        Self::with_transfer_config(profile, TransferConfig::default())
    }

    pub fn with_transfer_config(profile: DeviceProfile, transfer_config: TransferConfig) -> Self {
        Self {
            profile,
            charger: ChargerModeState::new(),
            transfer: TransferStates::default(),
            status: StatusFlags::new(),
            transfer_config,
        }
    }

    /// Drop per-cycle state. Charger state and the profile carry over.
    pub fn begin_cycle(&mut self) {
        self.status.reset();
        self.transfer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{TransferMode, TransferState};

    #[test]
    fn country_is_captured_once() {
        let mut profile = DeviceProfile::new(DeviceFamily::ThreeS, "3S 700");
        assert!(profile.capture_country(Country::Us));
        assert!(!profile.capture_country(Country::Europe));
        assert_eq!(profile.country(), Country::Us);
    }

    #[test]
    fn nominal_voltage_first_seen_wins() {
        let mut profile = DeviceProfile::new(DeviceFamily::Default, "x");
        assert_eq!(profile.remember_nominal_output_voltage(230.0), 230.0);
        assert_eq!(profile.remember_nominal_output_voltage(120.0), 230.0);
    }

    #[test]
    fn begin_cycle_clears_cycle_state() {
        let mut session = Session::new(DeviceProfile::new(DeviceFamily::Eaton9E, "9SX"));
        session.status.apply("online");
        session.transfer.set(TransferMode::Eco, TransferState::Active);
        session.begin_cycle();
        assert!(!session.status.is_resolved());
        assert_eq!(session.transfer.get(TransferMode::Eco), TransferState::Normal);
    }
}
