//! Config validation: unknown-key detection and interval sanity checks.
//!
//! `ProbeConfig` is a flat table, so only top-level keys are checked. An
//! unknown key is reported once (with any table under it) and matched against
//! the known keys by edit distance. Everything here warns; fatal checks live in
//! `ProbeConfig::validate`.

use std::fmt;

use super::defaults::{MAX_SENSIBLE_INTERVAL_MS, MIN_SENSIBLE_INTERVAL_MS};
use super::ProbeConfig;

/// Top-level keys `ProbeConfig` deserializes. Must track the struct fields.
pub const KNOWN_KEYS: &[&str] = &["interval_ms", "require_valid", "sensor_id"];

/// Largest edit distance still offered as a correction
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// A config problem worth logging but not worth refusing to start over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub detail: String,
    pub suggestion: Option<&'static str>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.detail)?;
        match self.suggestion {
            Some(known) => write!(f, " (did you mean '{known}'?)"),
            None => Ok(()),
        }
    }
}

/// Warn about every top-level key `ProbeConfig` does not know.
///
/// Unparseable TOML yields nothing here; the serde load reports it.
pub fn unknown_keys(raw_toml: &str) -> Vec<ConfigWarning> {
    let Ok(table) = raw_toml.parse::<toml::Table>() else {
        return Vec::new();
    };
    table
        .keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .map(|key| ConfigWarning {
            key: key.clone(),
            detail: "unknown config key, ignored".to_string(),
            suggestion: closest_key(key),
        })
        .collect()
}

/// The known key nearest to `unknown`, if it is a plausible typo.
pub fn closest_key(unknown: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|&known| (edit_distance(unknown, known), known))
        .filter(|&(distance, _)| distance <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(_, known)| known)
}

/// Levenshtein distance over chars, single rolling row.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Legal but suspicious intervals.
pub fn interval_warnings(config: &ProbeConfig) -> Vec<ConfigWarning> {
    let ms = config.interval_ms;
    let detail = if ms > 0 && ms < MIN_SENSIBLE_INTERVAL_MS {
        format!("{ms} ms is below {MIN_SENSIBLE_INTERVAL_MS} ms, the receiver will repeat the same sentence")
    } else if ms > MAX_SENSIBLE_INTERVAL_MS {
        format!("{ms} ms exceeds one hour, position updates will be very sparse")
    } else {
        return Vec::new();
    };
    vec![ConfigWarning {
        key: "interval_ms".to_string(),
        detail,
        suggestion: None,
    }]
}
