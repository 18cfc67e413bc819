//! # upsbridge - UPS data translation engine
//!
//! Translates the vendor-specific values of a UPS (Eaton / MGE HID paths)
//! into a vendor-neutral variable namespace, and translates write requests
//! and instant commands back into device writes.
//!
//! ## Architecture
//!
//! - `classifier`: maps the product and model strings to a device family
//! - `convert`: value formatters, lookup tables and dynamic converters
//! - `registry`: the mapping table, grouped into fallback chains
//! - `session`: per-device state (profile, status flags, charger history)
//! - `charger`: battery charger status derived from the ABM and legacy paths
//! - `transfer`: eco and bypass transfer windows and the bypass/eco sequence
//! - `engine`: evaluates the registry against a device each poll
//! - `driver`: async polling loop around the engine
//! - `store`: the sink receiving published variables
//! - `transport`: raw value access to the device
//! - `config`: YAML configuration and validation
//! - `logging`: structured logging and tracing

pub mod charger;
pub mod classifier;
pub mod config;
pub mod convert;
pub mod driver;
pub mod engine;
pub mod error;
pub mod logging;
pub mod registry;
pub mod session;
pub mod store;
pub mod transfer;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use driver::{DriverHandle, UpsDriver};
pub use engine::{Engine, PollKind};
pub use error::{BridgeError, Result};
pub use registry::Registry;
