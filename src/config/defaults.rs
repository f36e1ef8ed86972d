//! Probe-wide default constants.

// ============================================================================
// Probe
// ============================================================================

/// Default interval between probes (ms).
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// Standard device sensor carrying the RMC sentence.
pub const DEFAULT_SENSOR_ID: &str = "gps_gprmc";

/// Output channel accepted fixes are published on.
pub const OUTPUT_CHANNEL: &str = "out";

/// Intervals below this are accepted but warned about (ms).
///
/// Receivers typically emit one RMC per second; polling much faster re-reads
/// the same sentence.
pub const MIN_SENSIBLE_INTERVAL_MS: u64 = 100;

/// Intervals above this are accepted but warned about (ms). 3 600 000 = 1 hour.
pub const MAX_SENSIBLE_INTERVAL_MS: u64 = 3_600_000;

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "GPS_PROBE_CONFIG";

/// Environment variable overriding `interval_ms`.
pub const INTERVAL_ENV: &str = "GPS_PROBE_INTERVAL_MS";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "gps_probe.toml";
