//! Raw device access
//!
//! The engine never talks to a wire protocol directly. It reads and writes
//! raw numeric values through [`RawValueSource`], keyed by an opaque path
//! (a HID usage path for USB devices, a register name for serial ones).
//! [`SimulatedDevice`] is an in-memory implementation used by the binary
//! and by the tests.

use crate::config::SimulatorConfig;
use crate::logging::{StructuredLogger, get_logger};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Failure reported by a transport write
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    /// The device does not expose this path; a chain moves on to its next entry
    #[error("path not exposed by device: {path}")]
    UnknownPath { path: String },

    /// The device answered but refused the value
    #[error("device rejected write to {path}: {message}")]
    Rejected { path: String, message: String },

    /// Link-level failure
    #[error("I/O failure: {message}")]
    Io { message: String },
}

impl WriteError {
    pub fn unknown_path<S: Into<String>>(path: S) -> Self {
        WriteError::UnknownPath { path: path.into() }
    }

    pub fn rejected<S: Into<String>, M: Into<String>>(path: S, message: M) -> Self {
        WriteError::Rejected {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        WriteError::Io {
            message: message.into(),
        }
    }
}

/// Synchronous access to raw device values.
///
/// `read` returning `None` means the device does not expose the datum (or
/// the read failed); the engine treats both as a missing path.
pub trait RawValueSource {
    fn read(&mut self, path: &str) -> Option<f64>;
    fn write(&mut self, path: &str, value: f64) -> Result<(), WriteError>;
}

/// In-memory device backed by a map of raw values
#[derive(Debug)]
pub struct SimulatedDevice {
    values: BTreeMap<String, f64>,
    read_only: BTreeSet<String>,
    fail_writes: bool,
    writes: Vec<(String, f64)>,
    logger: StructuredLogger,
}

impl SimulatedDevice {
    /// Create an empty simulated device
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            read_only: BTreeSet::new(),
            fail_writes: false,
            writes: Vec::new(),
            logger: get_logger("transport"),
        }
    }

    /// Build a simulated device from the `simulator` configuration section
    pub fn from_config(config: &SimulatorConfig) -> Self {
        let mut device = Self::new();
        device.values = config.values.clone();
        device.read_only = config.read_only.iter().cloned().collect();
        device.fail_writes = config.fail_writes;
        device
    }

    /// Builder-style setter used heavily by tests
    pub fn with_value(mut self, path: &str, value: f64) -> Self {
        self.values.insert(path.to_string(), value);
        self
    }

    pub fn set(&mut self, path: &str, value: f64) {
        self.values.insert(path.to_string(), value);
    }

    pub fn remove(&mut self, path: &str) {
        self.values.remove(path);
    }

    pub fn mark_read_only(&mut self, path: &str) {
        self.read_only.insert(path.to_string());
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn value(&self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    /// Every acknowledged write, in order
    pub fn writes(&self) -> &[(String, f64)] {
        &self.writes
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RawValueSource for SimulatedDevice {
    fn read(&mut self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    fn write(&mut self, path: &str, value: f64) -> Result<(), WriteError> {
        if self.fail_writes {
            self.logger
                .warn(&format!("Simulated I/O failure writing {} to {}", value, path));
            return Err(WriteError::io("simulated link failure"));
        }
        if !self.values.contains_key(path) {
            return Err(WriteError::unknown_path(path));
        }
        if self.read_only.contains(path) {
            return Err(WriteError::rejected(path, "read-only"));
        }
        self.logger.debug(&format!("Write {} = {}", path, value));
        self.values.insert(path.to_string(), value);
        self.writes.push((path.to_string(), value));
        Ok(())
    }
}
