//! gps-probe: periodic GPS probe for radio front-end devices
//!
//! Polls the device's GPS sensor, decodes the NMEA recommended-minimum
//! sentence into a fixed-point position record and publishes accepted fixes
//! as `{core:latitude, core:longitude}` messages.
//!
//! ## Architecture
//!
//! - **Acquisition**: sensor access boundary and the NMEA decoder (pure, no I/O)
//! - **Background**: the probe scheduler (self-re-arming timer, validity gate)
//! - **Publish**: message sinks for accepted fixes
//! - **Config**: TOML-backed probe settings

pub mod acquisition;
pub mod background;
pub mod config;
pub mod publish;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, ProbeConfig};

// Re-export commonly used types
pub use types::{Fix, GgaFix, GpsReading};

// Re-export the decoder
pub use acquisition::{decode, decode_gga, decode_reading, DecodeError};

// Re-export collaborator seams
pub use acquisition::{ReplaySensor, SensorAccess, SensorError};
pub use publish::{ChannelPublisher, JsonLinesPublisher, ProbeMessage, PublishError, Publisher};

// Re-export the scheduler
pub use background::{CycleOutcome, ProbeError, ProbeScheduler, ProbeStats, SchedulerState};
