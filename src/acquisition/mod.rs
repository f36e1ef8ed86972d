//! GPS data acquisition module
//!
//! Device sensor access and NMEA sentence decoding.

pub mod nmea_parser;
pub mod sensors;

pub use nmea_parser::{decode, decode_gga, decode_reading, DecodeError};
pub use sensors::{RawSensorReading, ReplaySensor, SensorAccess, SensorError};
