//! Message publishing boundary
//!
//! Accepted fixes leave the probe as a flat string-to-string mapping on a
//! named output channel. Keys follow the SigMF `core:` namespace so the
//! message can be merged straight into a capture annotation. GGA readings
//! add the receiver's fix geometry under plain keys.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{Fix, GgaFix, GpsReading};

/// Key carrying the decimal-degree latitude
pub const LATITUDE_KEY: &str = "core:latitude";

/// Key carrying the decimal-degree longitude
pub const LONGITUDE_KEY: &str = "core:longitude";

/// GGA extras
pub const ALTITUDE_KEY: &str = "altitude";
pub const FIX_QUALITY_KEY: &str = "fix_quality";
pub const HDOP_KEY: &str = "hdop";
pub const NUM_SATS_KEY: &str = "num_sats";
pub const GPS_LOCKED_KEY: &str = "gps_locked";

/// Message payload: string keys to string values
pub type ProbeMessage = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Output channel '{0}' is closed")]
    ChannelClosed(String),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downstream message sink.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, channel: &str, message: ProbeMessage) -> Result<(), PublishError>;
}

/// The `{core:latitude, core:longitude}` message for one fix.
///
/// The timestamp is intentionally not forwarded.
pub fn position_message(fix: &Fix) -> ProbeMessage {
    BTreeMap::from([
        (LATITUDE_KEY.to_string(), fix.latitude.clone()),
        (LONGITUDE_KEY.to_string(), fix.longitude.clone()),
    ])
}

/// Position plus altitude, fix quality, HDOP, satellite count and lock state.
pub fn gga_message(gga: &GgaFix) -> ProbeMessage {
    BTreeMap::from([
        (LATITUDE_KEY.to_string(), gga.latitude.clone()),
        (LONGITUDE_KEY.to_string(), gga.longitude.clone()),
        (ALTITUDE_KEY.to_string(), gga.altitude_m.to_string()),
        (FIX_QUALITY_KEY.to_string(), gga.fix_quality.to_string()),
        (HDOP_KEY.to_string(), gga.hdop.to_string()),
        (NUM_SATS_KEY.to_string(), gga.satellites.to_string()),
        (GPS_LOCKED_KEY.to_string(), gga.is_locked().to_string()),
    ])
}

/// Message for whichever sentence the reading came from.
pub fn reading_message(reading: &GpsReading) -> ProbeMessage {
    match reading {
        GpsReading::Rmc(fix) => position_message(fix),
        GpsReading::Gga(gga) => gga_message(gga),
    }
}

/// A message together with the channel it was published on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedMessage {
    pub channel: String,
    pub message: ProbeMessage,
}

// ============================================================================
// JSON Lines Publisher
// ============================================================================

/// Writes one JSON object per message, newline-terminated, flushed each time.
pub struct JsonLinesPublisher<W: Write + Send + 'static> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send + 'static> Publisher for JsonLinesPublisher<W> {
    fn publish(&self, channel: &str, message: ProbeMessage) -> Result<(), PublishError> {
        let line = serde_json::to_string(&PublishedMessage {
            channel: channel.to_string(),
            message,
        })?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// Channel Publisher
// ============================================================================

/// Forwards messages into a tokio channel for in-process consumers.
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PublishedMessage>,
}

impl ChannelPublisher {
    /// Create the publisher and the receiving end consumers read from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PublishedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, channel: &str, message: ProbeMessage) -> Result<(), PublishError> {
        self.tx
            .send(PublishedMessage {
                channel: channel.to_string(),
                message,
            })
            .map_err(|_| PublishError::ChannelClosed(channel.to_string()))
    }
}
