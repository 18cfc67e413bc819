use super::*;

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            product: "Eaton 5P".to_string(),
            model: "650".to_string(),
            nominal_output_voltage: None,
            model_rules: Vec::new(),
            mapping_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/upsbridge.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            full_update_every: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            logging: LoggingConfig::default(),
            poll: PollConfig::default(),
            transfer: TransferConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}
