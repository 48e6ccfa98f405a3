//! Host-side stand-ins for the hardware the agent drives.
//!
//! Each mock hands out cloneable handles so a test can keep observing or
//! steering a device after moving it into the agent.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use core::net::Ipv4Addr;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::network::Station;
use crate::publish::{PublishError, Publisher};
use crate::sensors::{ClimateReadings, FRAME_LEN, Sensor, SensorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Digital pin whose level is shared with the test.
#[derive(Clone)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
    faulty: Rc<Cell<bool>>,
    follows_writes: bool,
}

impl MockPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            faulty: Rc::new(Cell::new(false)),
            follows_writes: true,
        }
    }

    /// A pin whose input level ignores writes, like a line held by a pull-up.
    pub fn stuck(level: bool) -> Self {
        Self {
            follows_writes: false,
            ..Self::new(level)
        }
    }

    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn set_level(&self, level: bool) {
        self.level.set(level);
    }

    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.set(faulty);
    }

    fn check(&self) -> Result<(), PinFault> {
        if self.faulty.get() {
            Err(PinFault)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, level: bool) -> Result<(), PinFault> {
        self.check()?;
        if self.follows_writes {
            self.level.set(level);
        }
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        self.check()?;
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.write(true)
    }
}

/// Blocking delay that returns immediately.
pub struct NoopDelay;

impl embedded_hal::delay::DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Virtual microsecond clock shared by [`WaveformPin`] and [`ClockDelay`].
#[derive(Clone, Default)]
pub struct MicrosClock(Rc<Cell<u64>>);

impl MicrosClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    fn advance(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

/// Blocking delay that advances a [`MicrosClock`] instead of sleeping.
pub struct ClockDelay(MicrosClock);

impl ClockDelay {
    pub fn new(clock: &MicrosClock) -> Self {
        Self(clock.clone())
    }
}

impl embedded_hal::delay::DelayNs for ClockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns).div_ceil(1000));
    }
}

/// One stretch of constant line level, in microseconds.
pub type Segment = (bool, u32);

// DHT11 phase lengths
const RELEASE_US: u32 = 30;
const RESPONSE_US: u32 = 80;
const BIT_LOW_US: u32 = 50;
pub const ZERO_HIGH_US: u32 = 27;
pub const ONE_HIGH_US: u32 = 70;

/// The level timeline a DHT11 drives after the host releases the line.
pub fn dht11_timeline(frame: [u8; FRAME_LEN], zero_us: u32, one_us: u32) -> Vec<Segment> {
    let mut timeline = vec![
        (true, RELEASE_US),
        (false, RESPONSE_US),
        (true, RESPONSE_US),
    ];
    for byte in frame {
        for bit in (0..8).rev() {
            let high = if byte & (1 << bit) != 0 { one_us } else { zero_us };
            timeline.push((false, BIT_LOW_US));
            timeline.push((true, high));
        }
    }
    timeline.push((false, BIT_LOW_US));
    timeline
}

/// Open-drain data line that replays a level timeline once the host releases it.
///
/// Driving the pin low holds the line low. Driving it high starts the
/// timeline at the current [`MicrosClock`] time; once the timeline runs out
/// the line sits at `idle`.
pub struct WaveformPin {
    clock: MicrosClock,
    timeline: Vec<Segment>,
    idle: bool,
    released_at: Option<u64>,
}

impl WaveformPin {
    pub fn new(clock: &MicrosClock, timeline: Vec<Segment>, idle: bool) -> Self {
        Self {
            clock: clock.clone(),
            timeline,
            idle,
            released_at: None,
        }
    }

    /// A well-behaved sensor transmitting `frame`.
    pub fn dht11(clock: &MicrosClock, frame: [u8; FRAME_LEN]) -> Self {
        Self::new(clock, dht11_timeline(frame, ZERO_HIGH_US, ONE_HIGH_US), true)
    }

    fn level_at(&self, mut offset_us: u64) -> bool {
        for &(level, duration) in &self.timeline {
            if offset_us < u64::from(duration) {
                return level;
            }
            offset_us -= u64::from(duration);
        }
        self.idle
    }
}

impl ErrorType for WaveformPin {
    type Error = PinFault;
}

impl InputPin for WaveformPin {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        Ok(match self.released_at {
            Some(start) => self.level_at(self.clock.now() - start),
            None => false,
        })
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for WaveformPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.released_at = None;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.released_at = Some(self.clock.now());
        Ok(())
    }
}

/// Async delay that records each requested sleep instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    sleeps_ms: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn sleeps_ms(&self) -> Vec<u32> {
        self.sleeps_ms.borrow().clone()
    }
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.sleeps_ms.borrow_mut().push(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.sleeps_ms.borrow_mut().push(us / 1000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.sleeps_ms.borrow_mut().push(ms);
    }
}

/// Sensor that replays a scripted sequence of results.
#[derive(Clone, Default)]
pub struct MockSensor {
    script: Rc<RefCell<VecDeque<Result<ClimateReadings, SensorError>>>>,
    reads: Rc<Cell<usize>>,
}

impl MockSensor {
    pub fn push_reading(&self, temperature_celsius: i16, humidity_percent: u8) {
        self.script.borrow_mut().push_back(Ok(ClimateReadings {
            temperature_celsius,
            humidity_percent,
        }));
    }

    pub fn push_error(&self, error: SensorError) {
        self.script.borrow_mut().push_back(Err(error));
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl Sensor for MockSensor {
    type Readings = ClimateReadings;

    async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        self.reads.set(self.reads.get() + 1);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(SensorError::ReadFailed {
                sensor: "mock",
                operation: "read",
                details: "script exhausted",
            }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

/// Publisher that records every message it is handed.
#[derive(Clone, Default)]
pub struct MockPublisher {
    sent: Rc<RefCell<Vec<Published>>>,
    failures: Rc<RefCell<VecDeque<PublishError>>>,
}

impl MockPublisher {
    pub fn sent(&self) -> Vec<Published> {
        self.sent.borrow().clone()
    }

    /// Make the next publish call fail with `error`.
    pub fn fail_next(&self, error: PublishError) {
        self.failures.borrow_mut().push_back(error);
    }
}

impl Publisher for MockPublisher {
    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), PublishError> {
        if let Some(error) = self.failures.borrow_mut().pop_front() {
            return Err(error);
        }
        self.sent.borrow_mut().push(Published {
            topic: topic.into(),
            payload: payload.to_vec(),
            retain,
        });
        Ok(())
    }
}

/// Station that gets an address after a fixed number of polls.
pub struct MockStation {
    pending_polls: usize,
    address: Ipv4Addr,
    pub polls: usize,
}

impl MockStation {
    pub fn new(pending_polls: usize, address: Ipv4Addr) -> Self {
        Self {
            pending_polls,
            address,
            polls: 0,
        }
    }
}

impl Station for MockStation {
    fn ipv4_address(&mut self) -> Option<Ipv4Addr> {
        self.polls += 1;
        if self.polls > self.pending_polls {
            Some(self.address)
        } else {
            None
        }
    }
}
