//! Configuration management for upsbridge
//!
//! Loads the YAML configuration: device identity and classification
//! overrides, logging, polling cadence, transfer window defaults and the
//! simulated device used when no hardware link is configured.

use crate::classifier::ModelRule;
use crate::error::{BridgeError, Result};
use crate::transfer::{ModeDefaults, TransferConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of the connected UPS
    pub device: DeviceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Polling cadence
    pub poll: PollConfig,

    /// Transfer window percentages used when the device publishes none
    pub transfer: TransferConfig,

    /// Raw values of the simulated device
    pub simulator: SimulatorConfig,
}

/// Device identity as reported by the UPS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Vendor product string (e.g. "Eaton 5P")
    pub product: String,

    /// Vendor model string (e.g. "650")
    pub model: String,

    /// Pins the nominal output voltage class before the first reading
    pub nominal_output_voltage: Option<f64>,

    /// Classification rules tried before the built-in table
    pub model_rules: Vec<ModelRule>,

    /// YAML mapping table replacing the built-in one
    pub mapping_file: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Polling cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between regular polls in milliseconds
    pub interval_ms: u64,

    /// Regular polls between two full updates
    pub full_update_every: u32,
}

/// Simulated device
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Raw value per device path
    pub values: BTreeMap<String, f64>,

    /// Paths that refuse writes
    pub read_only: Vec<String>,

    /// Fail every write with an I/O error
    pub fail_writes: bool,
}

fn check_percentages(field: &str, defaults: &ModeDefaults) -> Result<()> {
    let values = [
        defaults.voltage_low_pct,
        defaults.voltage_high_pct,
        defaults.frequency_pct,
    ];
    if values.iter().any(|pct| !pct.is_finite() || *pct <= 0.0 || *pct >= 100.0) {
        return Err(BridgeError::validation(
            field,
            "Percentages must be between 0 and 100",
        ));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = ["upsbridge.yaml", "/etc/upsbridge/config.yaml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.device.product.trim().is_empty() {
            return Err(BridgeError::validation(
                "device.product",
                "Product string cannot be empty",
            ));
        }

        if let Some(volts) = self.device.nominal_output_voltage
            && (!volts.is_finite() || volts <= 0.0)
        {
            return Err(BridgeError::validation(
                "device.nominal_output_voltage",
                "Must be positive",
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(BridgeError::validation(
                "poll.interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.poll.full_update_every == 0 {
            return Err(BridgeError::validation(
                "poll.full_update_every",
                "Must be greater than 0",
            ));
        }

        check_percentages("transfer.eco", &self.transfer.eco)?;
        check_percentages("transfer.bypass", &self.transfer.bypass)?;

        if let Some(path) = self
            .simulator
            .values
            .iter()
            .find_map(|(path, value)| (!value.is_finite()).then_some(path))
        {
            return Err(BridgeError::validation(
                "simulator.values",
                format!("Value of {} is not a number", path),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.full_update_every, 30);
        assert!(config.device.mapping_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.device.product = "  ".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.transfer.eco.frequency_pct = 0.0;
        assert!(matches!(
            config.validate(),
            Err(BridgeError::Validation { .. })
        ));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "device:\n  product: Eaton 9E\n  model: 2000i\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.device.model, "2000i");
        assert_eq!(config.logging.level, "INFO");
        assert_eq!(config.transfer, TransferConfig::default());
    }
}
