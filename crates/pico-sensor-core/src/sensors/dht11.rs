//! DHT11 single-wire temperature/humidity driver
//!
//! The data line is an open-drain pin with a pull-up: driving it high
//! releases the bus, driving it low pulls it down. A transaction is
//!
//! ```text
//! host:   ‾‾‾\______ 18ms+ ______/‾‾ 30us ‾‾
//! sensor:                                \__ 80us __/‾‾ 80us ‾‾\  40 bits
//! bit:    \__ 50us __/‾‾ 26-28us (0) | 70us (1) ‾‾\
//! ```
//!
//! The five received bytes are `[hum_int, hum_dec, temp_int, temp_dec, checksum]`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use super::{ClimateReadings, Sensor, SensorError};

const SENSOR: &str = "DHT11";

/// Number of bytes in one DHT11 transmission.
pub const FRAME_LEN: usize = 5;

const START_LOW_MS: u32 = 20;
const RESPONSE_TIMEOUT_US: u32 = 100;
const BIT_LOW_TIMEOUT_US: u32 = 80;
const BIT_HIGH_TIMEOUT_US: u32 = 100;

// High pulses longer than this are ones
const ONE_THRESHOLD_US: u32 = 40;

const NEGATIVE_FLAG: u8 = 0x80;

pub struct DHT11Sensor<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> DHT11Sensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// The pin must already be configured as open-drain with a pull-up.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Give back the pin and delay.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Decode a raw frame into readings, verifying the checksum.
    pub fn decode(frame: [u8; FRAME_LEN]) -> Result<ClimateReadings, SensorError> {
        let expected = frame[..4]
            .iter()
            .fold(0u8, |sum, byte| sum.wrapping_add(*byte));
        let actual = frame[4];

        if expected != actual {
            return Err(SensorError::Checksum {
                sensor: SENSOR,
                expected,
                actual,
            });
        }

        let magnitude = i16::from(frame[2]);
        let temperature_celsius = if frame[3] & NEGATIVE_FLAG != 0 {
            -magnitude
        } else {
            magnitude
        };

        Ok(ClimateReadings {
            temperature_celsius,
            humidity_percent: frame[0],
        })
    }

    /// Run one full transaction and return the raw frame.
    pub fn read_frame(&mut self) -> Result<[u8; FRAME_LEN], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::ReadFailed {
            sensor: SENSOR,
            operation: "send start signal",
            details: "pin write error",
        })?;
        self.delay.delay_ms(START_LOW_MS);

        // Everything after the start pulse is timing critical.
        critical_section::with(|_| self.receive())
    }

    fn receive(&mut self) -> Result<[u8; FRAME_LEN], SensorError> {
        self.pin.set_high().map_err(|_| SensorError::ReadFailed {
            sensor: SENSOR,
            operation: "release data line",
            details: "pin write error",
        })?;

        self.wait_while(true, RESPONSE_TIMEOUT_US, "sensor response")?;
        self.wait_while(false, RESPONSE_TIMEOUT_US, "response low phase")?;
        self.wait_while(true, RESPONSE_TIMEOUT_US, "response high phase")?;

        let mut frame = [0u8; FRAME_LEN];
        for bit in 0..FRAME_LEN * 8 {
            self.wait_while(false, BIT_LOW_TIMEOUT_US, "bit start")?;
            let high_us = self.wait_while(true, BIT_HIGH_TIMEOUT_US, "bit end")?;

            if high_us > ONE_THRESHOLD_US {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }

        Ok(frame)
    }

    /// Spin while the line sits at `level`, returning how many microseconds it took.
    fn wait_while(
        &mut self,
        level: bool,
        max_us: u32,
        operation: &'static str,
    ) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        loop {
            let high = self.pin.is_high().map_err(|_| SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "sample data line",
                details: "pin read error",
            })?;
            if high != level {
                return Ok(elapsed);
            }
            if elapsed >= max_us {
                return Err(SensorError::Timeout {
                    sensor: SENSOR,
                    operation,
                });
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
    }
}

impl<P, D> Sensor for DHT11Sensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    type Readings = ClimateReadings;

    async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        let frame = self.read_frame()?;
        debug!("DHT11 frame: {:02x?}", frame);
        Self::decode(frame)
    }
}
