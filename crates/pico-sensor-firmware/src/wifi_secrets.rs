//! Credentials and broker host, baked in by `build.rs` from `.env` or the
//! build environment.

use pico_sensor_core::config::Config;

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
pub const MQTT_BROKER: &str = env!("MQTT_BROKER");

/// The configuration the firmware runs with.
pub const CONFIG: Config<'static> = Config::new(WIFI_SSID, WIFI_PASSWORD, MQTT_BROKER);
