//! Shared data structures for the GPS probe
//!
//! - Fix: decoded RMC position + time + validity
//! - GgaFix: decoded GGA fix quality and geometry
//! - GpsReading: either of the above, as the probe publishes it

mod fix;

pub use fix::*;
