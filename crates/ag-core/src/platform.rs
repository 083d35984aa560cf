//! Clock and serial capability injected into the engine.
//!
//! The engine never touches hardware directly. A [`Platform`] supplies:
//! - a monotonic microsecond clock (`micros`)
//! - the serial link opened during initialization (`begin_serial`)
//! - the idle primitive used while pacing a fixed sample rate (`idle`)

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Waits longer than this are slept; shorter ones are spun.
const SPIN_THRESHOLD_MICROS: u64 = 2_000;

/// Hardware capability consumed by the engine.
pub trait Platform {
    /// Monotonic time since the platform started, in microseconds.
    fn micros(&self) -> u64;

    /// Open the serial link at `baud`.
    fn begin_serial(&mut self, baud: u32);

    /// Give up the processor while a pacing wait of `remaining_micros` is pending.
    ///
    /// Called in a loop until the clock catches up, so it may return early.
    fn idle(&mut self, _remaining_micros: u64) {
        std::thread::yield_now();
    }

    /// Clock reading in seconds.
    fn seconds(&self) -> f64 {
        self.micros() as f64 / 1e6
    }
}

/// Wall-clock platform for hosted builds.
#[derive(Debug)]
pub struct StdPlatform {
    start: Instant,
    baud: Option<u32>,
}

impl StdPlatform {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            baud: None,
        }
    }

    /// Baud rate of the open serial link, if any.
    pub fn baud(&self) -> Option<u32> {
        self.baud
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StdPlatform {
    fn micros(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    fn begin_serial(&mut self, baud: u32) {
        tracing::debug!(baud, "serial link opened on stdout");
        self.baud = Some(baud);
    }

    fn idle(&mut self, remaining_micros: u64) {
        if remaining_micros > SPIN_THRESHOLD_MICROS {
            // Leave the tail of the wait to the spin branch for accuracy.
            std::thread::sleep(Duration::from_micros(remaining_micros - SPIN_THRESHOLD_MICROS));
        } else {
            std::hint::spin_loop();
        }
    }
}

/// Deterministic platform driven by a manual clock.
///
/// Clones share the same clock, so a test can keep one handle to move time
/// while the engine owns another. Pacing waits advance the clock instantly.
#[derive(Debug, Clone, Default)]
pub struct SimPlatform {
    now: Rc<Cell<u64>>,
    baud: Rc<Cell<Option<u32>>>,
    idle_calls: Rc<Cell<u64>>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at `micros` instead of zero.
    pub fn starting_at(micros: u64) -> Self {
        let platform = Self::default();
        platform.now.set(micros);
        platform
    }

    /// Move the clock forward by `micros`.
    pub fn advance_micros(&self, micros: u64) {
        self.now.set(self.now.get().saturating_add(micros));
    }

    /// Move the clock forward by `seconds` (rounded to whole microseconds).
    pub fn advance_seconds(&self, seconds: f64) {
        self.advance_micros((seconds.max(0.0) * 1e6).round() as u64);
    }

    /// Baud rate passed to the last `begin_serial`.
    pub fn baud(&self) -> Option<u32> {
        self.baud.get()
    }

    /// Number of pacing idles served so far.
    pub fn idle_calls(&self) -> u64 {
        self.idle_calls.get()
    }
}

impl Platform for SimPlatform {
    fn micros(&self) -> u64 {
        self.now.get()
    }

    fn begin_serial(&mut self, baud: u32) {
        self.baud.set(Some(baud));
    }

    fn idle(&mut self, remaining_micros: u64) {
        self.idle_calls.set(self.idle_calls.get() + 1);
        self.advance_micros(remaining_micros);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clones_share_time() {
        let a = SimPlatform::new();
        let b = a.clone();
        a.advance_micros(1_500);
        assert_eq!(b.micros(), 1_500);
        assert!((b.seconds() - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn sim_idle_advances_clock() {
        let mut p = SimPlatform::starting_at(10);
        p.idle(990);
        assert_eq!(p.micros(), 1_000);
        assert_eq!(p.idle_calls(), 1);
    }

    #[test]
    fn sim_records_serial() {
        let mut p = SimPlatform::new();
        assert_eq!(p.baud(), None);
        p.begin_serial(9_600);
        assert_eq!(p.baud(), Some(9_600));
    }

    #[test]
    fn std_clock_is_monotonic() {
        let p = StdPlatform::new();
        let a = p.micros();
        let b = p.micros();
        assert!(b >= a);
    }
}
