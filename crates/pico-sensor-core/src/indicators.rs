//! Status LEDs driven from each reading
//!
//! The mirror LED follows the tilt switch. The alert LED lights when the
//! temperature is strictly above the configured threshold.

use embedded_hal::digital::{Error as _, ErrorKind, OutputPin, PinState};

use crate::reading::Reading;

/// Whether the alert LED should be on for `temperature_celsius`.
pub const fn alert_active(temperature_celsius: i16, threshold_celsius: i16) -> bool {
    temperature_celsius > threshold_celsius
}

/// Which LED failed to update, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedFault {
    pub led: &'static str,
    pub kind: ErrorKind,
}

pub struct Indicators<M, A> {
    mirror: M,
    alert: A,
    threshold_celsius: i16,
}

impl<M, A> Indicators<M, A>
where
    M: OutputPin,
    A: OutputPin,
{
    pub fn new(mirror: M, alert: A, threshold_celsius: i16) -> Self {
        Self {
            mirror,
            alert,
            threshold_celsius,
        }
    }

    /// Set both LEDs from `reading`.
    pub fn show(&mut self, reading: &Reading) -> Result<(), LedFault> {
        self.mirror
            .set_state(PinState::from(reading.tilted))
            .map_err(|e| LedFault {
                led: "tilt",
                kind: e.kind(),
            })?;

        let alert = alert_active(reading.temperature, self.threshold_celsius);
        self.alert
            .set_state(PinState::from(alert))
            .map_err(|e| LedFault {
                led: "alert",
                kind: e.kind(),
            })
    }
}
