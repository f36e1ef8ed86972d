//! Sensor access boundary
//!
//! The device exposes named motherboard sensors; a GPS sensor read returns a
//! pretty-printed `"<label>: <sentence>"` string. [`SensorAccess`] is the seam
//! the probe scheduler reads through, [`ReplaySensor`] plays back recorded
//! sentences for bench runs and tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor '{0}' is not exposed by the device")]
    NotFound(String),

    #[error("Sensor read failed: {0}")]
    ReadFailed(String),

    #[error("Malformed sensor reading (expected '<label>: <value>'): {0}")]
    MalformedReading(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Sensor Access Trait
// ============================================================================

/// Device sensor access, as consumed by the probe scheduler.
///
/// Calls are synchronous and expected to be short.
pub trait SensorAccess: Send + Sync + 'static {
    /// Identifiers of the sensors the device currently exposes.
    fn names(&self) -> HashSet<String>;

    /// Read one sensor, returning the device's `"<label>: <value>"` string.
    fn read(&self, sensor_id: &str) -> Result<String, SensorError>;
}

/// One sensor read split into its label and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSensorReading<'a> {
    pub label: &'a str,
    pub value: &'a str,
}

impl<'a> RawSensorReading<'a> {
    /// Split on the first `": "`; the value may itself contain the separator.
    pub fn parse(raw: &'a str) -> Result<Self, SensorError> {
        raw.split_once(": ")
            .map(|(label, value)| Self { label, value })
            .ok_or_else(|| SensorError::MalformedReading(raw.to_string()))
    }
}

// ============================================================================
// Replay Sensor
// ============================================================================

/// Replays recorded sentences under a single sensor identifier.
///
/// Each `read` returns the next line, wrapping at the end. Lines that already
/// carry a `"<label>: "` prefix are returned unchanged; bare sentences get the
/// upper-cased sensor id as label, as the device does.
pub struct ReplaySensor {
    sensor_id: String,
    lines: Vec<String>,
    cursor: Mutex<usize>,
}

impl ReplaySensor {
    /// Build from in-memory text, one sentence per line. Blank lines and
    /// `#` comments are skipped.
    pub fn from_text(sensor_id: &str, text: &str) -> Result<Self, SensorError> {
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| {
                if l.contains(": ") {
                    l.to_string()
                } else {
                    format!("{}: {}", sensor_id.to_uppercase(), l)
                }
            })
            .collect();

        if lines.is_empty() {
            return Err(SensorError::ReadFailed(
                "replay source contains no sentences".to_string(),
            ));
        }

        Ok(Self {
            sensor_id: sensor_id.to_string(),
            lines,
            cursor: Mutex::new(0),
        })
    }

    /// Load a replay file, one sentence per line.
    pub fn from_file(sensor_id: &str, path: &Path) -> Result<Self, SensorError> {
        let text = std::fs::read_to_string(path)?;
        let sensor = Self::from_text(sensor_id, &text)?;
        tracing::info!(
            path = %path.display(),
            sentences = sensor.lines.len(),
            "Loaded GPS replay file"
        );
        Ok(sensor)
    }

    /// Number of recorded readings in the replay loop.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl SensorAccess for ReplaySensor {
    fn names(&self) -> HashSet<String> {
        HashSet::from([self.sensor_id.clone()])
    }

    fn read(&self, sensor_id: &str) -> Result<String, SensorError> {
        if sensor_id != self.sensor_id {
            return Err(SensorError::NotFound(sensor_id.to_string()));
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let line = self.lines[*cursor % self.lines.len()].clone();
        *cursor = (*cursor + 1) % self.lines.len();
        Ok(line)
    }
}
