//! Desktop simulator for the pico-sensor MQTT telemetry agent.
//!
//! Runs the pico-sensor-core loop against simulated devices so the loop can be
//! exercised without hardware or a broker. The real DHT11 driver decodes a
//! simulated data line whose readings swing across the alert threshold, and
//! every seventh frame fails its checksum. The tilt switch flips every few
//! cycles. Published messages and LED changes are logged.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info pico-sensor-simulator [--fast] [CYCLES]
//! ```
//!
//! `--fast` divides every sleep by 100. Without `CYCLES` it runs forever.

use std::cell::Cell;
use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use embassy_futures::block_on;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use pico_sensor_core::app_state::{AppState, Hardware};
use pico_sensor_core::config::Config;
use pico_sensor_core::network::{Station, wait_for_address};
use pico_sensor_core::publish::{PublishError, Publisher};
use pico_sensor_core::sensors::{DHT11Sensor, FRAME_LEN};

/// Polls before the simulated access point hands out an address.
const JOIN_POLLS: u32 = 3;

/// Every n-th DHT11 frame is corrupted.
const FAULT_EVERY: u32 = 7;

/// The tilt switch flips after this many reads.
const TILT_PERIOD: u32 = 3;

const FAST_SPEEDUP: u64 = 100;

// ---------------------------------------------------------------------------
// Simulated devices
// ---------------------------------------------------------------------------

/// Simulated DHT11 data line on a virtual microsecond clock.
///
/// Each start pulse from the host queues a fresh transmission. Temperature is
/// a slow sinusoid around 30 °C peaking at 38 °C, and every seventh frame is
/// sent with a bad checksum. The line is sampled against the clock that
/// [`SimDhtDelay`] advances, so the real driver decodes it bit by bit.
struct SimDhtLine {
    clock: Rc<Cell<u64>>,
    frames: u32,
    timeline: Vec<(bool, u32)>,
    released_at: Option<u64>,
}

impl SimDhtLine {
    fn new(clock: Rc<Cell<u64>>) -> Self {
        Self {
            clock,
            frames: 0,
            timeline: Vec::new(),
            released_at: None,
        }
    }

    fn next_frame(&mut self) -> [u8; FRAME_LEN] {
        self.frames += 1;
        let phase = f64::from(self.frames) / 4.0;
        let temperature = (30.0 + 8.0 * phase.sin()).round() as u8;
        let humidity = (50.0 + 15.0 * (phase / 2.0).cos()).round() as u8;

        let mut frame = [humidity, 0, temperature, 0, 0];
        frame[4] = frame[..4].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
        if self.frames % FAULT_EVERY == 0 {
            frame[4] = frame[4].wrapping_add(1);
        }
        frame
    }

    /// Response handshake, 40 bits, then the trailing low before release.
    fn transmit(&mut self, frame: [u8; FRAME_LEN]) {
        self.timeline.clear();
        self.timeline.extend([(true, 30), (false, 80), (true, 80)]);
        for byte in frame {
            for bit in (0..8).rev() {
                let high_us = if byte & (1 << bit) != 0 { 70 } else { 27 };
                self.timeline.extend([(false, 50), (true, high_us)]);
            }
        }
        self.timeline.push((false, 50));
    }
}

impl ErrorType for SimDhtLine {
    type Error = Infallible;
}

impl InputPin for SimDhtLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let Some(start) = self.released_at else {
            return Ok(false);
        };
        let mut offset = self.clock.get() - start;
        for &(level, duration) in &self.timeline {
            if offset < u64::from(duration) {
                return Ok(level);
            }
            offset -= u64::from(duration);
        }
        // Pull-up
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for SimDhtLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.released_at = None;
        let frame = self.next_frame();
        self.transmit(frame);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.released_at = Some(self.clock.get());
        Ok(())
    }
}

/// Blocking delay for the DHT11 driver: advances the virtual clock only.
struct SimDhtDelay {
    clock: Rc<Cell<u64>>,
}

impl embedded_hal::delay::DelayNs for SimDhtDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock
            .set(self.clock.get() + u64::from(ns).div_ceil(1000));
    }
}

struct SimTilt {
    samples: u32,
}

impl ErrorType for SimTilt {
    type Error = Infallible;
}

impl InputPin for SimTilt {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.samples += 1;
        Ok((self.samples / TILT_PERIOD) % 2 == 1)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// An LED that logs whenever it changes state.
struct SimLed {
    name: &'static str,
    lit: bool,
}

impl SimLed {
    fn new(name: &'static str) -> Self {
        Self { name, lit: false }
    }

    fn drive(&mut self, lit: bool) {
        if self.lit != lit {
            info!("{} LED {}", self.name, if lit { "on" } else { "off" });
        }
        self.lit = lit;
    }
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(true);
        Ok(())
    }
}

/// Access point that associates after a few polls.
struct SimStation {
    polls: u32,
}

impl Station for SimStation {
    fn ipv4_address(&mut self) -> Option<Ipv4Addr> {
        self.polls += 1;
        (self.polls > JOIN_POLLS).then_some(Ipv4Addr::new(192, 168, 1, 50))
    }
}

/// Broker stand-in that logs every message instead of sending it.
struct LogPublisher;

impl Publisher for LogPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), PublishError> {
        match std::str::from_utf8(payload) {
            Ok(text) => info!("[{}] retain={} {:?}", topic, retain, text),
            Err(_) => warn!("[{}] retain={} {} non-UTF-8 bytes", topic, retain, payload.len()),
        }
        Ok(())
    }
}

/// Thread-sleeping delay, optionally sped up.
struct StdDelay {
    speedup: u64,
}

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns) / self.speedup));
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut fast = false;
    let mut cycles: Option<u32> = None;
    for arg in std::env::args().skip(1) {
        if arg == "--fast" {
            fast = true;
        } else if let Ok(n) = arg.parse() {
            cycles = Some(n);
        } else {
            warn!("Ignoring unknown argument {:?}", arg);
        }
    }

    let mut delay = StdDelay {
        speedup: if fast { FAST_SPEEDUP } else { 1 },
    };
    let config = Config::new("simulated-ap", "", "localhost");

    info!("Starting pico-sensor simulator");
    block_on(async {
        let mut station = SimStation { polls: 0 };
        wait_for_address(&mut station, &mut delay, config.join_poll_interval_ms()).await;

        let dht_clock = Rc::new(Cell::new(0));
        let hardware = Hardware {
            sensor: DHT11Sensor::new(
                SimDhtLine::new(dht_clock.clone()),
                SimDhtDelay { clock: dht_clock },
            ),
            tilt: SimTilt { samples: 0 },
            mirror_led: SimLed::new("mirror"),
            alert_led: SimLed::new("alert"),
        };
        let Ok(mut app) = AppState::start(hardware, LogPublisher, config).await else {
            unreachable!("LogPublisher never fails");
        };

        match cycles {
            Some(n) => {
                for _ in 0..n {
                    app.tick(&mut delay).await;
                }
                info!("Finished {} cycles", n);
            }
            None => app.run(&mut delay).await,
        }
    });
}
