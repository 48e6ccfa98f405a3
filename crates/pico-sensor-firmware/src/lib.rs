//! ESP32-S3 firmware-specific modules for pico-sensor
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: Wi-Fi station bring-up, the embassy-net stack task, the MQTT
//! client adapter and build-time credential management.

#![no_std]

pub mod mqtt;
pub mod wifi;
pub mod wifi_secrets;
