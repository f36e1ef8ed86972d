//! NMEA 0183 Sentence Decoder
//!
//! Decodes the minimum NMEA subset needed for a position + time fix.
//! Sentences are comma-delimited ASCII: `$TTSSS,f1,f2,...[*hh]`
//!
//! RMC (recommended minimum data) field layout:
//! - 0: identifier (`$GPRMC` / `$GNRMC`)
//! - 1: UTC time of day, `HHMMSS.ff` (variable fractional digits)
//! - 2: status, `A` = active, anything else = void
//! - 3/4: latitude `DDMM.mmmm` + `N`/`S`
//! - 5/6: longitude `DDDMM.mmmm` + `E`/`W`
//! - 7/8: speed over ground (knots), course (unused)
//! - 9: UTC date, `DDMMYY`
//!
//! GGA (fix data) field layout:
//! - 1: UTC time, 2/3: latitude, 4/5: longitude
//! - 6: fix quality, 7: satellites used, 8: HDOP, 9: altitude (m)
//!
//! Degree/minute conversion uses exact decimal arithmetic; no binary floats
//! touch a coordinate.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::{Fix, GgaFix, GpsReading};

/// NMEA decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unsupported sentence type: {0}")]
    UnsupportedSentenceType(String),

    #[error("Malformed {field} field: {message}")]
    Malformed { field: &'static str, message: String },
}

impl DecodeError {
    fn malformed(field: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            message: message.into(),
        }
    }
}

/// Sentence identifiers accepted as recommended-minimum data
pub const RMC_IDENTIFIERS: &[&str] = &["$GPRMC", "$GNRMC"];

/// Sentence identifiers accepted as GGA fix data
pub const GGA_IDENTIFIERS: &[&str] = &["$GPGGA", "$GNGGA"];

/// Minimum comma-separated fields in an RMC sentence (identifier through date)
pub const RMC_MIN_FIELDS: usize = 10;

/// Minimum comma-separated fields in a GGA sentence (identifier through altitude)
pub const GGA_MIN_FIELDS: usize = 10;

/// Fractional digits in every emitted coordinate
pub const COORDINATE_SCALE: u32 = 6;

/// Two-digit years at or above this value belong to the 1900s
const CENTURY_PIVOT: u32 = 69;

/// Decode one RMC sentence into a [`Fix`].
///
/// A void status (`V`) is not an error: the fix decodes with `valid == false`
/// and the caller decides whether to use it.
pub fn decode(sentence: &str) -> Result<Fix, DecodeError> {
    let fields = split_fields(sentence, RMC_IDENTIFIERS, RMC_MIN_FIELDS)?;

    let valid = fields[2] == "A";
    let latitude = decode_latitude(fields[3], fields[4])?;
    let longitude = decode_longitude(fields[5], fields[6])?;
    let timestamp = decode_timestamp(fields[9], fields[1])?;

    Ok(Fix {
        valid,
        timestamp,
        latitude: format_coordinate(latitude),
        longitude: format_coordinate(longitude),
    })
}

/// Decode an RMC or GGA sentence, picking the decoder by identifier.
///
/// Anything else is reported as RMC's `UnsupportedSentenceType`.
pub fn decode_reading(sentence: &str) -> Result<GpsReading, DecodeError> {
    let identifier = sentence.split(',').next().unwrap_or_default();
    if GGA_IDENTIFIERS.contains(&identifier) {
        decode_gga(sentence).map(GpsReading::Gga)
    } else {
        decode(sentence).map(GpsReading::Rmc)
    }
}

/// Decode one GGA sentence into a [`GgaFix`].
pub fn decode_gga(sentence: &str) -> Result<GgaFix, DecodeError> {
    let fields = split_fields(sentence, GGA_IDENTIFIERS, GGA_MIN_FIELDS)?;

    let (time, fraction) = decode_time(fields[1])?;
    let latitude = decode_latitude(fields[2], fields[3])?;
    let longitude = decode_longitude(fields[4], fields[5])?;

    let fix_quality = fields[6]
        .parse::<u8>()
        .map_err(|e| DecodeError::malformed("fix quality", format!("'{}': {}", fields[6], e)))?;
    let satellites = fields[7]
        .parse::<u8>()
        .map_err(|e| DecodeError::malformed("satellites", format!("'{}': {}", fields[7], e)))?;
    let hdop = parse_finite(fields[8], "hdop")?;
    let altitude_m = parse_finite(fields[9], "altitude")?;

    Ok(GgaFix {
        time: format!("{}.{}", time.format("%H:%M:%S"), fraction),
        latitude: format_coordinate(latitude),
        longitude: format_coordinate(longitude),
        fix_quality,
        satellites,
        hdop,
        altitude_m,
    })
}

/// Check the identifier, strip line endings and any `*hh` checksum, split on `,`.
fn split_fields<'a>(
    sentence: &'a str,
    identifiers: &[&str],
    min_fields: usize,
) -> Result<Vec<&'a str>, DecodeError> {
    let sentence = sentence.trim_end_matches(['\r', '\n']);
    let body = match sentence.rsplit_once('*') {
        Some((body, _checksum)) => body,
        None => sentence,
    };

    let fields: Vec<&str> = body.split(',').collect();
    if !identifiers.contains(&fields[0]) {
        return Err(DecodeError::UnsupportedSentenceType(fields[0].to_string()));
    }
    if fields.len() < min_fields {
        return Err(DecodeError::malformed(
            "fields",
            format!("expected at least {} fields, got {}", min_fields, fields.len()),
        ));
    }
    Ok(fields)
}

/// Latitude `DDMM.mmmm` + `N`/`S` to signed decimal degrees.
pub fn decode_latitude(raw: &str, hemisphere: &str) -> Result<Decimal, DecodeError> {
    let magnitude = decode_degrees_minutes(raw, 2, "latitude")?;
    if magnitude > Decimal::from(90) {
        return Err(DecodeError::malformed(
            "latitude",
            format!("'{raw}' exceeds 90 degrees"),
        ));
    }
    match hemisphere {
        "N" => Ok(magnitude),
        "S" => Ok(negate(magnitude)),
        other => Err(DecodeError::malformed(
            "latitude hemisphere",
            format!("expected N or S, got '{other}'"),
        )),
    }
}

/// Longitude `DDDMM.mmmm` + `E`/`W` to signed decimal degrees.
pub fn decode_longitude(raw: &str, hemisphere: &str) -> Result<Decimal, DecodeError> {
    let magnitude = decode_degrees_minutes(raw, 3, "longitude")?;
    if magnitude > Decimal::from(180) {
        return Err(DecodeError::malformed(
            "longitude",
            format!("'{raw}' exceeds 180 degrees"),
        ));
    }
    match hemisphere {
        "E" => Ok(magnitude),
        "W" => Ok(negate(magnitude)),
        other => Err(DecodeError::malformed(
            "longitude hemisphere",
            format!("expected E or W, got '{other}'"),
        )),
    }
}

/// `degrees + minutes / 60`, with the first `degree_digits` characters as degrees.
fn decode_degrees_minutes(
    raw: &str,
    degree_digits: usize,
    field: &'static str,
) -> Result<Decimal, DecodeError> {
    if raw.len() <= degree_digits || !raw.is_char_boundary(degree_digits) {
        return Err(DecodeError::malformed(
            field,
            format!("'{raw}' is too short for {degree_digits} degree digits plus minutes"),
        ));
    }
    let (degrees, minutes) = raw.split_at(degree_digits);

    if !degrees.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::malformed(
            field,
            format!("non-numeric degrees '{degrees}'"),
        ));
    }
    if !is_unsigned_decimal(minutes) {
        return Err(DecodeError::malformed(
            field,
            format!("non-numeric minutes '{minutes}'"),
        ));
    }

    let degrees = Decimal::from_str(degrees)
        .map_err(|e| DecodeError::malformed(field, format!("degrees '{degrees}': {e}")))?;
    let minutes = Decimal::from_str(minutes)
        .map_err(|e| DecodeError::malformed(field, format!("minutes '{minutes}': {e}")))?;

    if minutes >= Decimal::from(60) {
        return Err(DecodeError::malformed(
            field,
            format!("minutes {minutes} out of range (0-60)"),
        ));
    }

    Ok(degrees + minutes / Decimal::from(60))
}

/// Digits with at most one `.`, at least one digit.
fn is_unsigned_decimal(s: &str) -> bool {
    let mut seen_dot = false;
    let mut digits = 0usize;
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    digits > 0
}

fn negate(value: Decimal) -> Decimal {
    if value.is_zero() {
        value
    } else {
        -value
    }
}

/// Round half away from zero to 6 places and always print 6 fractional digits.
pub fn format_coordinate(value: Decimal) -> String {
    let mut rounded =
        value.round_dp_with_strategy(COORDINATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(COORDINATE_SCALE);
    rounded.to_string()
}

/// Time of day `HHMMSS.ff` to (whole seconds, verbatim fractional digits).
fn decode_time(raw: &str) -> Result<(NaiveTime, &str), DecodeError> {
    let (whole, fraction) = raw
        .split_once('.')
        .ok_or_else(|| DecodeError::malformed("time", format!("'{raw}' has no fractional seconds")))?;

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::malformed(
            "time",
            format!("non-numeric fractional seconds '{fraction}'"),
        ));
    }
    let [hour, minute, second] = split_pairs(whole, "time")?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| DecodeError::malformed("time", format!("'{whole}' is not a valid time of day")))?;

    Ok((time, fraction))
}

/// Date `DDMMYY` to a calendar date; two-digit years pivot at 69.
fn decode_date(raw: &str) -> Result<NaiveDate, DecodeError> {
    let [day, month, yy] = split_pairs(raw, "date")?;
    let year = if yy >= CENTURY_PIVOT { 1900 + yy } else { 2000 + yy };

    // u32 -> i32 cannot fail for years below 2069
    let year = i32::try_from(year)
        .map_err(|_| DecodeError::malformed("date", format!("year {year} out of range")))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DecodeError::malformed("date", format!("'{raw}' is not a valid calendar date")))
}

/// Combine `DDMMYY` and `HHMMSS.ff` into `YYYY-MM-DDTHH:MM:SS.ffZ`.
pub fn decode_timestamp(date: &str, time: &str) -> Result<String, DecodeError> {
    let (time, fraction) = decode_time(time)?;
    let date = decode_date(date)?;
    let instant = NaiveDateTime::new(date, time);
    Ok(format!("{}.{}Z", instant.format("%Y-%m-%dT%H:%M:%S"), fraction))
}

/// Exactly six ASCII digits as three two-digit numbers.
fn split_pairs(raw: &str, field: &'static str) -> Result<[u32; 3], DecodeError> {
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::malformed(
            field,
            format!("expected 6 digits, got '{raw}'"),
        ));
    }
    let pair = |i: usize| -> Result<u32, DecodeError> {
        raw[i..i + 2]
            .parse::<u32>()
            .map_err(|e| DecodeError::malformed(field, e.to_string()))
    };
    Ok([pair(0)?, pair(2)?, pair(4)?])
}

fn parse_finite(raw: &str, field: &'static str) -> Result<f64, DecodeError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(DecodeError::malformed(field, format!("non-finite value {v}"))),
        Err(e) => Err(DecodeError::malformed(field, format!("'{raw}': {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    fn coord(raw: &str, hemisphere: &str, lon: bool) -> String {
        let value = if lon {
            decode_longitude(raw, hemisphere)
        } else {
            decode_latitude(raw, hemisphere)
        };
        format_coordinate(value.expect("coordinate should decode"))
    }

    #[test]
    fn test_decode_sample_sentence() {
        let fix = decode(SAMPLE).expect("sample should decode");
        assert!(fix.valid);
        assert_eq!(fix.timestamp, "1994-03-23T12:35:19.00Z");
        assert_eq!(fix.latitude, "48.117300");
        assert_eq!(fix.longitude, "11.516667");
    }

    #[test]
    fn test_latitude_hemispheres() {
        assert_eq!(coord("4807.038", "N", false), "48.117300");
        assert_eq!(coord("4807.038", "S", false), "-48.117300");
    }

    #[test]
    fn test_longitude_uses_three_degree_digits() {
        assert_eq!(coord("01131.000", "E", true), "11.516667");
        assert_eq!(coord("01131.000", "W", true), "-11.516667");
    }

    #[test]
    fn test_integer_minutes_keep_six_digits() {
        assert_eq!(coord("4800.000", "N", false), "48.000000");
        assert_eq!(coord("4800", "N", false), "48.000000");
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        // 0.00003 min / 60 = 0.0000005 deg, exactly half a unit in the 6th place
        assert_eq!(coord("0000.00003", "N", false), "0.000001");
        assert_eq!(coord("0000.00003", "S", false), "-0.000001");
    }

    #[test]
    fn test_zero_is_never_negative() {
        assert_eq!(coord("0000.000", "S", false), "0.000000");
        assert_eq!(coord("00000.000", "W", true), "0.000000");
    }

    #[test]
    fn test_high_precision_minutes() {
        // 59.999999 / 60 = 0.99999998333... -> rounds up to the next degree
        assert_eq!(coord("8959.999999", "N", false), "90.000000");
        assert_eq!(coord("12345.678901", "E", true), "123.761315");
    }

    #[test]
    fn test_bad_hemisphere_is_malformed() {
        let err = decode_latitude("4807.038", "E").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Malformed { field: "latitude hemisphere", .. }
        ));
        let err = decode_longitude("01131.000", "").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Malformed { field: "longitude hemisphere", .. }
        ));
    }

    #[test]
    fn test_out_of_range_coordinates_do_not_wrap() {
        assert!(decode_latitude("9100.000", "N").is_err());
        assert!(decode_longitude("18100.000", "E").is_err());
        assert!(decode_latitude("4860.000", "N").is_err(), "60 minutes is not a valid minute value");
    }

    #[test]
    fn test_non_numeric_coordinates() {
        for raw in ["", "4", "48", "48x7.0", "4807.0.1", "-807.038", "48 7.038"] {
            let result = decode_latitude(raw, "N");
            assert!(
                matches!(result, Err(DecodeError::Malformed { field: "latitude", .. })),
                "'{raw}' should be malformed, got {result:?}"
            );
        }
    }

    #[test]
    fn test_timestamp_assembly() {
        assert_eq!(
            decode_timestamp("230394", "123519.00").unwrap(),
            "1994-03-23T12:35:19.00Z"
        );
        assert_eq!(
            decode_timestamp("010100", "000000.5").unwrap(),
            "2000-01-01T00:00:00.5Z"
        );
        assert_eq!(
            decode_timestamp("311268", "235959.123456").unwrap(),
            "2068-12-31T23:59:59.123456Z"
        );
        assert_eq!(
            decode_timestamp("010169", "010203.000").unwrap(),
            "1969-01-01T01:02:03.000Z"
        );
    }

    #[test]
    fn test_fraction_copied_verbatim() {
        assert_eq!(
            decode_timestamp("150624", "081500.").unwrap(),
            "2024-06-15T08:15:00.Z"
        );
        assert_eq!(
            decode_timestamp("150624", "081500.1000").unwrap(),
            "2024-06-15T08:15:00.1000Z"
        );
    }

    #[test]
    fn test_time_without_fraction_is_malformed() {
        let err = decode_timestamp("230394", "123519").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { field: "time", .. }));
    }

    #[test]
    fn test_invalid_calendar_values() {
        assert!(decode_timestamp("310294", "123519.00").is_err(), "Feb 31 is not a date");
        assert!(decode_timestamp("230394", "246000.00").is_err());
        assert!(decode_timestamp("23039", "123519.00").is_err());
        assert!(decode_timestamp("230394", "12a519.00").is_err());
        assert!(decode_timestamp("230394", "123519.0x").is_err());
    }

    #[test]
    fn test_void_status_decodes_as_invalid() {
        let fix = decode("$GPRMC,123519.00,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W")
            .expect("void fix should still decode");
        assert!(!fix.valid);
        assert_eq!(fix.latitude, "48.117300");
    }

    #[test]
    fn test_unsupported_sentence_type() {
        let err = decode("$GPGGA,123519.00,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,").unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedSentenceType("$GPGGA".to_string()));

        let err = decode("").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedSentenceType(_)));
    }

    #[test]
    fn test_too_few_fields() {
        let err = decode("$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { field: "fields", .. }));
    }

    #[test]
    fn test_gnrmc_and_line_endings_accepted() {
        let fix = decode("$GNRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n")
            .expect("GNRMC with CRLF should decode");
        assert_eq!(fix.longitude, "11.516667");
    }

    #[test]
    fn test_decode_gga() {
        let gga = decode_gga("$GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*76")
            .expect("GGA should decode");
        assert_eq!(gga.time, "09:27:50.000");
        assert_eq!(gga.latitude, "53.361337");
        assert_eq!(gga.longitude, "-6.505620");
        assert_eq!(gga.fix_quality, 1);
        assert_eq!(gga.satellites, 8);
        assert!((gga.hdop - 1.03).abs() < 1e-9);
        assert!((gga.altitude_m - 61.7).abs() < 1e-9);
    }

    #[test]
    fn test_decode_reading_dispatches_on_identifier() {
        assert!(matches!(decode_reading(SAMPLE), Ok(GpsReading::Rmc(ref fix)) if fix.valid));
        let gga = decode_reading("$GNGGA,092750.000,5321.6802,N,00630.3372,W,0,0,99.9,0.0,M,,M,,")
            .expect("GGA should decode");
        assert!(matches!(gga, GpsReading::Gga(_)));
        assert!(!gga.is_valid());
        assert_eq!(
            decode_reading("$GPGSV,3,1,11").unwrap_err(),
            DecodeError::UnsupportedSentenceType("$GPGSV".to_string())
        );
    }

    #[test]
    fn test_decode_gga_rejects_rmc() {
        assert!(matches!(
            decode_gga(SAMPLE),
            Err(DecodeError::UnsupportedSentenceType(_))
        ));
    }
}
