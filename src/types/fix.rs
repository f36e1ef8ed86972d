//! GPS fix types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decoded position + time record from one recommended-minimum (RMC) sentence.
///
/// Coordinates are kept as fixed-point decimal strings (6 fractional digits)
/// so downstream consumers can compare positions exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Device reported an active fix (status field `A`)
    pub valid: bool,
    /// ISO-8601 UTC instant, fractional seconds copied from the sentence
    /// (e.g. `1994-03-23T12:35:19.00Z`)
    pub timestamp: String,
    /// Decimal degrees, negative = southern hemisphere
    pub latitude: String,
    /// Decimal degrees, negative = western hemisphere
    pub longitude: String,
}

impl Fix {
    /// Parse the timestamp back into a chrono instant.
    ///
    /// Returns `None` when the sentence carried an empty fractional part
    /// (`HHMMSS.`), which RFC 3339 does not accept.
    pub fn utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Decoded GGA (fix data) sentence.
///
/// Carries the fix quality and satellite geometry that RMC lacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GgaFix {
    /// UTC time of day, `HH:MM:SS` plus the sentence's fractional seconds
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    /// 0 = no fix, 1 = GPS, 2 = DGPS, 4/5 = RTK ...
    pub fix_quality: u8,
    /// Satellites used in the solution
    pub satellites: u8,
    /// Horizontal dilution of precision
    pub hdop: f64,
    /// Antenna altitude above mean sea level (meters)
    pub altitude_m: f64,
}

impl GgaFix {
    /// Whether the receiver reports any position solution.
    pub fn is_locked(&self) -> bool {
        self.fix_quality > 0
    }
}

/// One decoded sensor reading, tagged by the sentence the sensor carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sentence", rename_all = "lowercase")]
pub enum GpsReading {
    Rmc(Fix),
    Gga(GgaFix),
}

impl GpsReading {
    /// RMC status `A`, or a GGA fix quality above zero.
    pub fn is_valid(&self) -> bool {
        match self {
            GpsReading::Rmc(fix) => fix.valid,
            GpsReading::Gga(gga) => gga.is_locked(),
        }
    }

    pub fn latitude(&self) -> &str {
        match self {
            GpsReading::Rmc(fix) => &fix.latitude,
            GpsReading::Gga(gga) => &gga.latitude,
        }
    }

    pub fn longitude(&self) -> &str {
        match self {
            GpsReading::Rmc(fix) => &fix.longitude,
            GpsReading::Gga(gga) => &gga.longitude,
        }
    }

    /// RMC carries a full timestamp, GGA only the time of day
    pub fn time(&self) -> &str {
        match self {
            GpsReading::Rmc(fix) => &fix.timestamp,
            GpsReading::Gga(gga) => &gga.time,
        }
    }
}
