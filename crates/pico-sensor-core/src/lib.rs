//! Hardware-independent core library for pico-sensor
//!
//! This crate contains all platform-agnostic logic for the telemetry agent:
//! configuration, the reading record and its JSON payload, the LED policy,
//! sensor trait definitions and the DHT11 driver, the network join wait, the
//! publisher abstraction and the poll-publish loop itself.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod app_state;
pub mod config;
pub mod indicators;
pub mod network;
pub mod publish;
pub mod reading;
pub mod sensors;

#[cfg(test)]
pub(crate) mod mock;
