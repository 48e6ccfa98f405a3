//! Agent configuration
//!
//! Everything here is fixed at build time. The firmware fills the
//! credentials and broker host from its build environment; all other values
//! default to the deployed constants.

use serde::{Deserialize, Serialize};

/// MQTT client identifier presented to the broker.
pub const CLIENT_ID: &str = "pico-sensor";

/// Topic every reading (and the startup clear) is published to.
pub const TOPIC: &str = "pico/data";

/// Broker host used when nothing else is configured.
pub const DEFAULT_BROKER: &str = "192.168.1.20";

/// Plain MQTT, no TLS.
pub const MQTT_PORT: u16 = 1883;

/// Alert LED turns on strictly above this temperature (°C).
pub const ALERT_THRESHOLD_CELSIUS: i16 = 35;

/// Sleep between loop iterations.
pub const PUBLISH_INTERVAL_SECS: u32 = 5;

/// Sleep between association status polls.
pub const JOIN_POLL_INTERVAL_SECS: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub mqtt: MqttConfig<'a>,
    pub alert_threshold_celsius: i16,
    pub publish_interval_secs: u32,
    pub join_poll_interval_secs: u32,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MqttConfig<'a> {
    pub broker: &'a str,
    pub port: u16,
    pub client_id: &'a str,
    pub topic: &'a str,
}

impl<'a> Config<'a> {
    /// Configuration with the given credentials and broker host, everything
    /// else at its fixed default.
    pub const fn new(ssid: &'a str, password: &'a str, broker: &'a str) -> Self {
        Self {
            internet: InternetConfig { ssid, password },
            mqtt: MqttConfig {
                broker,
                port: MQTT_PORT,
                client_id: CLIENT_ID,
                topic: TOPIC,
            },
            alert_threshold_celsius: ALERT_THRESHOLD_CELSIUS,
            publish_interval_secs: PUBLISH_INTERVAL_SECS,
            join_poll_interval_secs: JOIN_POLL_INTERVAL_SECS,
        }
    }

    /// Interval between loop iterations in milliseconds.
    pub const fn publish_interval_ms(&self) -> u32 {
        self.publish_interval_secs * 1000
    }

    /// Interval between join polls in milliseconds.
    pub const fn join_poll_interval_ms(&self) -> u32 {
        self.join_poll_interval_secs * 1000
    }
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self::new("", "", DEFAULT_BROKER)
    }
}
