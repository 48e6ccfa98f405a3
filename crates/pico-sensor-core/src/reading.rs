//! The per-iteration reading and its wire payload.

use serde::Serialize;
use thiserror_no_std::Error;

use crate::sensors::ClimateReadings;

/// Enough for `{"temp":-128,"hum":255,"tilt":false}` with room to spare.
pub const PAYLOAD_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("{0}")]
    Serialize(serde_json_core::ser::Error),
    #[error("payload is not valid UTF-8")]
    Utf8,
}

/// One snapshot of the hardware, published as
/// `{"temp":<int>,"hum":<int>,"tilt":<bool>}`.
///
/// Field order is the key order on the wire; subscribers depend on it.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    #[serde(rename = "temp")]
    pub temperature: i16,
    #[serde(rename = "hum")]
    pub humidity: u8,
    #[serde(rename = "tilt")]
    pub tilted: bool,
}

impl Reading {
    pub fn new(climate: ClimateReadings, tilted: bool) -> Self {
        Self {
            temperature: climate.temperature_celsius,
            humidity: climate.humidity_percent,
            tilted,
        }
    }

    /// Serialize into `buf`, returning the JSON text.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b str, PayloadError> {
        let len = serde_json_core::to_slice(self, buf).map_err(PayloadError::Serialize)?;
        core::str::from_utf8(&buf[..len]).map_err(|_| PayloadError::Utf8)
    }
}
