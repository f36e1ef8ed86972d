//! Probe Configuration Module
//!
//! Provides the scheduler's construction-time settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `GPS_PROBE_CONFIG` environment variable (path to TOML file)
//! 2. `gps_probe.toml` in the current working directory
//! 3. Built-in defaults
//!
//! `GPS_PROBE_INTERVAL_MS` then overrides the interval, and CLI flags
//! override everything.
//!
//! ```ignore
//! let config = ProbeConfig::load();
//! let scheduler = ProbeScheduler::new(config, sensor, publisher)?;
//! ```

mod probe_config;
pub mod defaults;
pub mod validation;

pub use probe_config::*;
