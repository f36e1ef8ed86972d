//! Decoder Regression Tests
//!
//! Pins the RMC decoder's output format: coordinate conversion, fixed
//! six-digit rendering, timestamp assembly and the malformed-input cases the
//! probe scheduler relies on being reported as errors rather than panics.

use gps_probe::acquisition::nmea_parser::{decode_latitude, decode_longitude, format_coordinate};
use gps_probe::{decode, decode_gga, DecodeError, Fix};

const ACTIVE: &str = "$GPRMC,123519.00,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

fn rmc(time: &str, status: &str, lat: &str, ns: &str, lon: &str, ew: &str, date: &str) -> String {
    format!("$GPRMC,{time},{status},{lat},{ns},{lon},{ew},0.0,0.0,{date},,")
}

fn assert_malformed(result: Result<Fix, DecodeError>, field: &str) {
    match result {
        Err(DecodeError::Malformed { field: f, .. }) => {
            assert!(f.contains(field), "expected malformed '{field}', got '{f}'");
        }
        other => panic!("expected malformed '{field}', got {other:?}"),
    }
}

// ============================================================================
// Coordinates
// ============================================================================

#[test]
fn reference_sentence_decodes() {
    let fix = decode(ACTIVE).expect("reference sentence should decode");
    assert_eq!(
        fix,
        Fix {
            valid: true,
            timestamp: "1994-03-23T12:35:19.00Z".to_string(),
            latitude: "48.117300".to_string(),
            longitude: "11.516667".to_string(),
        }
    );
}

#[test]
fn latitude_hemisphere_sets_sign() {
    let north = decode(&rmc("123519.00", "A", "4807.038", "N", "01131.000", "E", "230394")).unwrap();
    let south = decode(&rmc("123519.00", "A", "4807.038", "S", "01131.000", "E", "230394")).unwrap();
    assert_eq!(north.latitude, "48.117300");
    assert_eq!(south.latitude, "-48.117300");
}

#[test]
fn longitude_uses_three_degree_digits() {
    let east = decode(&rmc("123519.00", "A", "4807.038", "N", "01131.000", "E", "230394")).unwrap();
    let west = decode(&rmc("123519.00", "A", "4807.038", "N", "01131.000", "W", "230394")).unwrap();
    assert_eq!(east.longitude, "11.516667");
    assert_eq!(west.longitude, "-11.516667");

    let far_west = decode(&rmc("000000.0", "A", "0000.000", "N", "17959.999", "W", "010100")).unwrap();
    assert_eq!(far_west.longitude, "-179.999983");
}

#[test]
fn coordinates_always_carry_six_fraction_digits() {
    let cases = [
        ("4800.000", "N", "48.000000"),
        ("4800", "N", "48.000000"),
        ("0000.0000", "S", "0.000000"),
        ("4807.03812345", "N", "48.117302"),
        ("8959.99999999", "N", "90.000000"),
    ];
    for (raw, hemisphere, expected) in cases {
        let value = decode_latitude(raw, hemisphere).unwrap();
        let rendered = format_coordinate(value);
        assert_eq!(rendered, expected, "latitude {raw}{hemisphere}");
        let (_, fraction) = rendered.split_once('.').unwrap();
        assert_eq!(fraction.len(), 6);
    }
}

#[test]
fn rounding_is_half_away_from_zero() {
    // 0.00000050 degrees = 0.00003 minutes
    let east = format_coordinate(decode_longitude("00000.00003", "E").unwrap());
    let west = format_coordinate(decode_longitude("00000.00003", "W").unwrap());
    assert_eq!(east, "0.000001");
    assert_eq!(west, "-0.000001");
}

// ============================================================================
// Timestamps
// ============================================================================

#[test]
fn timestamp_assembly() {
    let fix = decode(&rmc("123519.00", "A", "4807.038", "N", "01131.000", "E", "230394")).unwrap();
    assert_eq!(fix.timestamp, "1994-03-23T12:35:19.00Z");

    let fix = decode(&rmc("010203.5", "A", "4807.038", "N", "01131.000", "E", "050607")).unwrap();
    assert_eq!(fix.timestamp, "2007-06-05T01:02:03.5Z");

    let fix = decode(&rmc("235959.123", "A", "4807.038", "N", "01131.000", "E", "311268")).unwrap();
    assert_eq!(fix.timestamp, "2068-12-31T23:59:59.123Z");
}

#[test]
fn timestamp_parses_as_utc_instant() {
    let fix = decode(ACTIVE).unwrap();
    let instant = fix.utc().expect("RFC 3339 timestamp");
    assert_eq!(instant.to_rfc3339(), "1994-03-23T12:35:19+00:00");
}

#[test]
fn empty_fraction_is_copied_verbatim() {
    let fix = decode(&rmc("123519.", "A", "4807.038", "N", "01131.000", "E", "230394")).unwrap();
    assert_eq!(fix.timestamp, "1994-03-23T12:35:19.Z");
    assert!(fix.utc().is_none());
}

// ============================================================================
// Validity
// ============================================================================

#[test]
fn void_status_decodes_as_invalid() {
    for status in ["V", "", "a", "X"] {
        let fix = decode(&rmc("123519.00", status, "4807.038", "N", "01131.000", "E", "230394"))
            .unwrap_or_else(|e| panic!("status '{status}' should decode: {e}"));
        assert!(!fix.valid, "status '{status}' must not be valid");
        assert_eq!(fix.latitude, "48.117300");
    }
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn too_few_fields_is_malformed() {
    assert_malformed(decode("$GPRMC,123519.00,A,4807.038,N,01131.000,E,0,0"), "fields");
    assert_malformed(decode("$GPRMC"), "fields");
}

#[test]
fn time_without_fraction_is_malformed() {
    assert_malformed(
        decode(&rmc("123519", "A", "4807.038", "N", "01131.000", "E", "230394")),
        "time",
    );
}

#[test]
fn bad_fields_are_malformed() {
    let cases = [
        (rmc("123519.00", "A", "48x7.038", "N", "01131.000", "E", "230394"), "latitude"),
        (rmc("123519.00", "A", "4807.038", "Q", "01131.000", "E", "230394"), "latitude hemisphere"),
        (rmc("123519.00", "A", "4860.000", "N", "01131.000", "E", "230394"), "latitude"),
        (rmc("123519.00", "A", "9100.000", "N", "01131.000", "E", "230394"), "latitude"),
        (rmc("123519.00", "A", "4807.038", "N", "18100.000", "E", "230394"), "longitude"),
        (rmc("123519.00", "A", "4807.038", "N", "01131.000", "", "230394"), "longitude hemisphere"),
        (rmc("123519.00", "A", "4807.038", "N", "01131.000", "E", "300294"), "date"),
        (rmc("123519.00", "A", "4807.038", "N", "01131.000", "E", "2303"), "date"),
        (rmc("256000.00", "A", "4807.038", "N", "01131.000", "E", "230394"), "time"),
    ];
    for (sentence, field) in cases {
        assert_malformed(decode(&sentence), field);
    }
}

#[test]
fn other_sentence_types_are_unsupported() {
    for sentence in ["$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47", "", "garbage"] {
        assert!(
            matches!(decode(sentence), Err(DecodeError::UnsupportedSentenceType(_))),
            "'{sentence}' should be unsupported"
        );
    }
}

#[test]
fn multi_constellation_talker_accepted() {
    let fix = decode(&ACTIVE.replacen("$GPRMC", "$GNRMC", 1)).unwrap();
    assert_eq!(fix.latitude, "48.117300");
}

// ============================================================================
// GGA
// ============================================================================

#[test]
fn gga_fix_decodes() {
    let gga = decode_gga("$GPGGA,123519.00,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47").unwrap();
    assert_eq!(gga.time, "12:35:19.00");
    assert_eq!(gga.latitude, "48.117300");
    assert_eq!(gga.longitude, "11.516667");
    assert_eq!(gga.satellites, 8);
    assert!(gga.is_locked());
    assert!((gga.altitude_m - 545.4).abs() < f64::EPSILON);

    assert!(matches!(decode_gga(ACTIVE), Err(DecodeError::UnsupportedSentenceType(_))));
}
