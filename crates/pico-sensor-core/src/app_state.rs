//! Agent context and the poll-publish loop
//!
//! [`AppState`] owns every hardware handle and the publisher. It is built
//! once at startup and then driven forever by the main task through
//! [`AppState::run`].

use embedded_hal::digital::{Error as _, ErrorKind, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use log::{error, info};
use thiserror_no_std::Error;

use crate::config::Config;
use crate::indicators::{Indicators, LedFault};
use crate::publish::{PublishError, Publisher};
use crate::reading::{PAYLOAD_CAPACITY, PayloadError, Reading};
use crate::sensors::{ClimateReadings, Sensor, SensorError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Sensor(SensorError),
    #[error("{pin} pin fault: {kind:?}")]
    Pin { pin: &'static str, kind: ErrorKind },
    #[error("payload encoding failed: {0}")]
    Payload(PayloadError),
    #[error("publish failed: {0}")]
    Publish(PublishError),
}

impl From<SensorError> for AppError {
    fn from(value: SensorError) -> Self {
        Self::Sensor(value)
    }
}

impl From<PublishError> for AppError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}

impl From<LedFault> for AppError {
    fn from(value: LedFault) -> Self {
        Self::Pin {
            pin: value.led,
            kind: value.kind,
        }
    }
}

/// The devices the loop reads and drives.
pub struct Hardware<S, T, M, A> {
    pub sensor: S,
    pub tilt: T,
    pub mirror_led: M,
    pub alert_led: A,
}

pub struct AppState<'c, S, T, M, A, P> {
    config: Config<'c>,
    sensor: S,
    tilt: T,
    indicators: Indicators<M, A>,
    publisher: P,
}

impl<'c, S, T, M, A, P> AppState<'c, S, T, M, A, P>
where
    S: Sensor<Readings = ClimateReadings>,
    T: InputPin,
    M: OutputPin,
    A: OutputPin,
    P: Publisher,
{
    /// Take ownership of the hardware and a connected publisher, then clear
    /// whatever message the broker retained for our topic.
    ///
    /// A failure here is a startup failure and is handed back to the caller.
    pub async fn start(
        hardware: Hardware<S, T, M, A>,
        mut publisher: P,
        config: Config<'c>,
    ) -> Result<Self, PublishError> {
        publisher.publish(config.mqtt.topic, &[], true).await?;
        info!("MQTT Connected to {}", config.mqtt.broker);

        Ok(Self {
            config,
            sensor: hardware.sensor,
            tilt: hardware.tilt,
            indicators: Indicators::new(
                hardware.mirror_led,
                hardware.alert_led,
                config.alert_threshold_celsius,
            ),
            publisher,
        })
    }

    pub fn config(&self) -> &Config<'c> {
        &self.config
    }

    /// One pass: measure, update the LEDs, publish.
    pub async fn poll_once(&mut self) -> Result<Reading, AppError> {
        let climate = self.sensor.read().await?;
        let tilted = self.tilt.is_high().map_err(|e| AppError::Pin {
            pin: "tilt",
            kind: e.kind(),
        })?;

        let reading = Reading::new(climate, tilted);
        self.indicators.show(&reading)?;

        let mut buf = [0u8; PAYLOAD_CAPACITY];
        let payload = reading.encode(&mut buf).map_err(AppError::Payload)?;
        info!("Publishing: {}", payload);

        self.publisher
            .publish(self.config.mqtt.topic, payload.as_bytes(), false)
            .await?;

        Ok(reading)
    }

    /// Run one iteration, log its failure if any, then sleep.
    pub async fn tick<D: DelayNs>(&mut self, delay: &mut D) {
        if let Err(e) = self.poll_once().await {
            error!("Error: {}", e);
        }
        delay.delay_ms(self.config.publish_interval_ms()).await;
    }

    pub async fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            self.tick(delay).await;
        }
    }
}
