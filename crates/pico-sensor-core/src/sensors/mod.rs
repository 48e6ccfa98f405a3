mod dht11;

use thiserror_no_std::Error;

pub use dht11::{DHT11Sensor, FRAME_LEN};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: timed out waiting for {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    Checksum {
        sensor: &'static str,
        expected: u8,
        actual: u8,
    },
    #[error("{sensor}: failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
}

/// Temperature and relative humidity at the sensor's native integer resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReadings {
    pub temperature_celsius: i16,
    pub humidity_percent: u8,
}

/// Trait for sensors that produce typed readings.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;

    /// Trigger a measurement and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}
