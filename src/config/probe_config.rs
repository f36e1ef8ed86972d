//! Probe Configuration - interval, validity policy and sensor selection
//!
//! Every field has a serde default, so an empty file (or no file) yields a
//! probe that polls `gps_gprmc` once per second and only publishes active fixes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Construction-time settings for the probe scheduler.
///
/// Load with `ProbeConfig::load()` which searches:
/// 1. `$GPS_PROBE_CONFIG` env var
/// 2. `./gps_probe.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Milliseconds between probes (must be > 0)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Suppress publishing unless the device flags the fix as active
    #[serde(default = "default_require_valid")]
    pub require_valid: bool,

    /// Device sensor to poll (`gps_gprmc` or `gps_gpgga`)
    #[serde(default = "default_sensor_id")]
    pub sensor_id: String,
}

fn default_interval_ms() -> u64 {
    defaults::DEFAULT_INTERVAL_MS
}
fn default_require_valid() -> bool {
    true
}
fn default_sensor_id() -> String {
    defaults::DEFAULT_SENSOR_ID.to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            require_valid: default_require_valid(),
            sensor_id: default_sensor_id(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration using the standard search order, then apply the
    /// `GPS_PROBE_INTERVAL_MS` override.
    pub fn load() -> Self {
        let mut config = Self::load_file_or_default();
        config.apply_env_overrides();
        config
    }

    fn load_file_or_default() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), sensor = %config.sensor_id, "Loaded probe config from GPS_PROBE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from GPS_PROBE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "GPS_PROBE_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./gps_probe.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(sensor = %config.sensor_id, "Loaded probe config from ./gps_probe.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./gps_probe.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No gps_probe.toml found — using built-in defaults");
        Self::default()
    }

    /// `GPS_PROBE_INTERVAL_MS` wins over the file value when it parses.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(defaults::INTERVAL_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) => {
                    info!(interval_ms = ms, "Probe interval overridden by GPS_PROBE_INTERVAL_MS");
                    self.interval_ms = ms;
                }
                Err(e) => warn!(value = %raw, error = %e, "Ignoring unparseable GPS_PROBE_INTERVAL_MS"),
            }
        }
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Typos only warn; serde fills in defaults for anything missing
        for w in super::validation::unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Probe config saved");
        Ok(())
    }

    /// Probe interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Reject settings the scheduler cannot run with.
    ///
    /// Rules:
    /// - interval_ms must be > 0
    /// - sensor_id must be non-empty and must not contain the `": "` label separator
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.interval_ms == 0 {
            errors.push("interval_ms must be > 0".to_string());
        }
        if self.sensor_id.trim().is_empty() {
            errors.push("sensor_id must not be empty".to_string());
        }
        if self.sensor_id.contains(": ") {
            errors.push(format!(
                "sensor_id '{}' must not contain the ': ' label separator",
                self.sensor_id
            ));
        }

        for w in super::validation::interval_warnings(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================
