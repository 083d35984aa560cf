//! The signal unit contract.
//!
//! Every participant in the engine is a [`Unit`]:
//! - **setup**: called once, during engine initialization, in registration order
//! - **update**: called once per engine step, in registration order
//!
//! Two value-access refinements layer on top:
//! - [`Getter`]: exposes the unit's current value (`get`)
//! - [`Putter`]: consumes a value and returns a derived one (`put`)
//!
//! Units are shared between the host and the engine as [`Shared`] handles.
//! The host owns them; the engine only keeps weak references.

use std::cell::RefCell;
use std::rc::Rc;

/// Host-owned handle to a unit. The engine never extends its lifetime.
pub type Shared<U> = Rc<RefCell<U>>;

/// Threshold at or above which an analog value reads as "on".
pub const DIGITAL_THRESHOLD: f64 = 0.5;

/// Timing snapshot handed to units on setup and on every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCtx {
    /// Engine elapsed time in seconds (paced model, not the raw clock).
    pub seconds: f64,
    /// Number of completed steps, including the one in progress.
    pub step: u64,
    /// Measured sample rate in Hz (`f64::MAX` before the first step).
    pub sample_rate: f64,
    /// Configured target rate, `None` in automatic mode.
    pub target_sample_rate: Option<f64>,
}

impl StepCtx {
    /// Context seen by `setup()`: time zero, no steps yet.
    pub fn at_start(target_sample_rate: Option<f64>) -> Self {
        Self {
            seconds: 0.0,
            step: 0,
            sample_rate: f64::MAX,
            target_sample_rate,
        }
    }
}

/// Base contract for everything the engine drives.
///
/// Neither method may fail; implementations clamp or ignore bad state.
pub trait Unit {
    /// One-time initialization, right after engine-level initialization.
    ///
    /// Default implementation does nothing.
    fn setup(&mut self, _ctx: &StepCtx) {}

    /// Per-step update.
    ///
    /// Default implementation does nothing (pure putters only react to `put`).
    fn update(&mut self, _ctx: &StepCtx) {}
}

/// Unit exposing a readable analog value.
pub trait Getter: Unit {
    /// Current value of the unit.
    fn get(&self) -> f64;

    /// Digital view of the current value.
    fn is_on(&self) -> bool {
        analog_to_digital(self.get())
    }
}

/// Unit consuming values written by the host or by other units.
pub trait Putter: Getter {
    /// Push a value in, returning the unit's new output.
    fn put(&mut self, value: f64) -> f64;

    /// Push a digital value in (false/true map to 0.0/1.0).
    fn put_on(&mut self, on: bool) -> f64 {
        self.put(digital_to_analog(on))
    }
}

pub fn analog_to_digital(value: f64) -> bool {
    value >= DIGITAL_THRESHOLD
}

pub fn digital_to_analog(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

impl<U: Unit + ?Sized> Unit for Box<U> {
    fn setup(&mut self, ctx: &StepCtx) {
        (**self).setup(ctx)
    }

    fn update(&mut self, ctx: &StepCtx) {
        (**self).update(ctx)
    }
}
