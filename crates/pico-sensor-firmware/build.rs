use std::env;

/// Build-time settings baked into the firmware, with their fallbacks.
const SETTINGS: &[(&str, &str)] = &[
    ("WIFI_SSID", ""),
    ("WIFI_PASSWORD", ""),
    ("MQTT_BROKER", "192.168.1.20"),
];

fn main() {
    // A `.env` next to Cargo.toml (or in any parent) wins over nothing, but the
    // real environment wins over `.env`.
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    for (key, fallback) in SETTINGS {
        let value = env::var(key).unwrap_or_else(|_| (*fallback).into());
        if value.is_empty() {
            println!("cargo:warning={key} is not set (see .env.example)");
        }
        println!("cargo:rustc-env={key}={value}");
        println!("cargo:rerun-if-env-changed={key}");
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
