//! Step/timing engine.
//!
//! The engine owns:
//! - a fixed-capacity, ordered registry of weak unit references
//! - the elapsed-time model (paced seconds, step counter, first-run flag)
//! - the sample-rate policy (automatic or fixed, with optional pacing)
//!
//! Host programs call [`Engine::initialize`] once and then [`Engine::step`] in
//! a loop, reading and writing unit values between steps.
//!
//! # Timing model
//!
//! - **Automatic** (default): each step advances elapsed time by the real time
//!   measured since the previous step. No waiting.
//! - **Fixed** (`set_sample_rate`): each step advances elapsed time by exactly
//!   `1 / rate`, whatever the clock says. With pacing enabled, `step` idles on
//!   the platform until that much real time has passed since the previous step.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ids::UnitId;
use crate::numeric::{clamp_min, ensure_finite};
use crate::platform::{Platform, StdPlatform};
use crate::unit::{Shared, StepCtx, Unit};

/// Smallest accepted fixed sample rate (Hz). Lower requests clamp to this.
pub const MIN_SAMPLE_RATE: f64 = 1e-3;

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, `initialize` not called yet.
    Uninitialized,
    /// Initialized, no step taken yet (first run).
    Ready,
    /// At least one step taken.
    Running,
}

pub(crate) type UnitRef = Weak<RefCell<dyn Unit>>;

/// Scheduler driving every registered unit once per step.
pub struct Engine<P: Platform = StdPlatform> {
    platform: P,
    config: EngineConfig,
    units: Vec<UnitRef>,
    state: EngineState,
    /// Paced elapsed time (seconds since initialization).
    seconds: f64,
    /// Platform clock reading captured at the end of initialization.
    zero_micros: u64,
    /// Platform clock reading at the end of the previous step's timing phase.
    mark_micros: u64,
    /// Measured rate of the last step (Hz).
    sample_rate: f64,
    /// Fixed rate (Hz); zero means automatic.
    target_sample_rate: f64,
    n_steps: u64,
    first_run: bool,
}

impl<P: Platform> Engine<P> {
    /// Create an engine on top of `platform`.
    pub fn new(platform: P, config: EngineConfig) -> Self {
        let units = Vec::with_capacity(config.capacity.min(crate::config::DEFAULT_CAPACITY));
        Self {
            platform,
            config,
            units,
            state: EngineState::Uninitialized,
            seconds: 0.0,
            zero_micros: 0,
            mark_micros: 0,
            sample_rate: f64::MAX,
            target_sample_rate: 0.0,
            n_steps: 0,
            first_run: true,
        }
    }

    /// Create an engine with the default configuration.
    pub fn with_platform(platform: P) -> Self {
        Self::new(platform, EngineConfig::default())
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register `unit`, returning its registry id.
    ///
    /// Registering an instance that is already present returns the existing
    /// id. When the registry is full the unit is dropped and `None` is
    /// returned; the unit stays usable by the host but is never updated.
    pub fn add<U: Unit + 'static>(&mut self, unit: &Shared<U>) -> Option<UnitId> {
        match self.try_add(unit) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(%err, "unit registration dropped");
                None
            }
        }
    }

    /// Strict form of [`Engine::add`].
    pub fn try_add<U: Unit + 'static>(&mut self, unit: &Shared<U>) -> EngineResult<UnitId> {
        if let Some(id) = self.id_of(unit) {
            tracing::debug!(%id, "unit already registered");
            return Ok(id);
        }
        if self.units.len() >= self.config.capacity {
            return Err(EngineError::CapacityExceeded {
                capacity: self.config.capacity,
            });
        }

        let shared: Rc<RefCell<dyn Unit>> = unit.clone();
        let id = UnitId::from_index(self.units.len() as u32);
        self.units.push(Rc::downgrade(&shared));
        tracing::debug!(%id, units = self.units.len(), "unit registered");
        Ok(id)
    }

    /// Wrap `unit` in a shared handle and register it.
    ///
    /// The handle is returned even when registration was dropped.
    pub fn spawn<U: Unit + 'static>(&mut self, unit: U) -> Shared<U> {
        let shared = Rc::new(RefCell::new(unit));
        self.add(&shared);
        shared
    }

    /// Registry id of `unit`, if registered.
    pub fn id_of<U: Unit + 'static>(&self, unit: &Shared<U>) -> Option<UnitId> {
        let target = Rc::as_ptr(unit) as *const ();
        self.units
            .iter()
            .position(|slot| slot.as_ptr() as *const () == target)
            .map(|index| UnitId::from_index(index as u32))
    }

    pub fn contains<U: Unit + 'static>(&self, unit: &Shared<U>) -> bool {
        self.id_of(unit).is_some()
    }

    /// Number of registry slots in use (including units the host dropped).
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of registered units whose host handle is still alive.
    pub fn live_units(&self) -> usize {
        self.units.iter().filter(|slot| slot.strong_count() > 0).count()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reset time state, open the serial link, run every unit's `setup`, then
    /// start the clock.
    pub fn initialize(&mut self) {
        let ctx = self.reset();
        drive(&self.units, "setup", |unit| unit.setup(&ctx));
        self.start_clock();
    }

    /// Reset time state and open the serial link; returns the setup context.
    pub(crate) fn reset(&mut self) -> StepCtx {
        tracing::info!(units = self.units.len(), "initializing engine");

        self.seconds = 0.0;
        self.sample_rate = f64::MAX;
        self.target_sample_rate = 0.0;
        self.n_steps = 0;
        self.first_run = true;
        if let Some(rate) = self.config.sample_rate {
            self.set_sample_rate(rate);
        }

        self.platform.begin_serial(self.config.baud_rate);
        StepCtx::at_start(self.target_sample_rate())
    }

    /// Capture the clock zero point once every unit has been set up.
    pub(crate) fn start_clock(&mut self) {
        self.zero_micros = self.platform.micros();
        self.mark_micros = self.zero_micros;
        self.state = EngineState::Ready;
    }

    /// Advance time and update every unit once, in registration order.
    pub fn step(&mut self) {
        let ctx = self.advance();
        drive(&self.units, "update", |unit| unit.update(&ctx));
    }

    /// Timing half of [`Engine::step`]: pace, advance time and the counter,
    /// and return the context the units are about to see.
    pub(crate) fn advance(&mut self) -> StepCtx {
        if self.state == EngineState::Uninitialized {
            tracing::warn!("step() called before initialize(); initializing now");
            self.initialize();
        }

        let nominal = self.nominal_step_seconds();
        if let Some(dt) = nominal {
            if self.config.pace {
                self.wait_since_mark(dt);
            }
        }

        let now = self.platform.micros();
        let real_dt = micros_to_seconds(now.saturating_sub(self.mark_micros));
        self.mark_micros = now;
        self.sample_rate = if real_dt > 0.0 { 1.0 / real_dt } else { f64::MAX };

        self.seconds += nominal.unwrap_or(real_dt);
        self.n_steps += 1;
        self.first_run = false;
        self.state = EngineState::Running;

        let ctx = self.ctx();
        tracing::trace!(step = ctx.step, seconds = ctx.seconds, "step");
        ctx
    }

    /// Idle on the platform until `dt` seconds of real time have passed since
    /// the previous mark.
    fn wait_since_mark(&mut self, dt: f64) {
        loop {
            let waited = micros_to_seconds(self.platform.micros().saturating_sub(self.mark_micros));
            if waited >= dt {
                break;
            }
            let remaining = ((dt - waited) * 1e6).ceil() as u64;
            self.platform.idle(remaining.max(1));
        }
    }

    fn nominal_step_seconds(&self) -> Option<f64> {
        if self.auto_sample_rate() {
            None
        } else {
            Some(1.0 / self.target_sample_rate)
        }
    }

    /// Timing snapshot as seen by units during the current step.
    pub fn ctx(&self) -> StepCtx {
        StepCtx {
            seconds: self.seconds,
            step: self.n_steps,
            sample_rate: self.sample_rate,
            target_sample_rate: self.target_sample_rate(),
        }
    }

    // ------------------------------------------------------------------
    // Sample-rate policy
    // ------------------------------------------------------------------

    /// Switch to fixed-rate mode at `rate` Hz.
    ///
    /// Requests below [`MIN_SAMPLE_RATE`] (zero, negative, NaN) clamp to it.
    pub fn set_sample_rate(&mut self, rate: f64) {
        let applied = clamp_min(rate, MIN_SAMPLE_RATE);
        tracing::debug!(requested = rate, applied, "fixed sample rate");
        self.target_sample_rate = applied;
    }

    /// Strict form of [`Engine::set_sample_rate`]; leaves the policy untouched
    /// on error.
    pub fn try_set_sample_rate(&mut self, rate: f64) -> EngineResult<()> {
        ensure_finite(rate, "sample rate")?;
        if rate < MIN_SAMPLE_RATE {
            return Err(EngineError::Clamped {
                what: "sample rate",
                requested: rate,
                applied: MIN_SAMPLE_RATE,
            });
        }
        self.set_sample_rate(rate);
        Ok(())
    }

    /// Switch back to automatic mode.
    pub fn enable_auto_sample_rate(&mut self) {
        tracing::debug!("automatic sample rate");
        self.target_sample_rate = 0.0;
    }

    pub fn auto_sample_rate(&self) -> bool {
        self.target_sample_rate <= 0.0
    }

    /// Measured rate of the last step in Hz (`f64::MAX` before any step).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Configured fixed rate, `None` in automatic mode.
    pub fn target_sample_rate(&self) -> Option<f64> {
        (!self.auto_sample_rate()).then_some(self.target_sample_rate)
    }

    // ------------------------------------------------------------------
    // Time queries
    // ------------------------------------------------------------------

    /// Raw platform clock (`real_time`) or paced elapsed time since
    /// initialization.
    pub fn seconds(&self, real_time: bool) -> f64 {
        if real_time {
            self.platform.seconds()
        } else {
            self.seconds
        }
    }

    /// Real time since initialization, bypassing the paced model.
    pub fn real_elapsed(&self) -> f64 {
        micros_to_seconds(self.platform.micros().saturating_sub(self.zero_micros))
    }

    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    /// True between `initialize` and the first `step`.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }
}

impl Engine<StdPlatform> {
    /// Wall-clock engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(StdPlatform::new(), config)
    }
}

impl Default for Engine<StdPlatform> {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl<P: Platform> Engine<P> {
    /// Copy of the registry, for driving units without holding the engine.
    pub(crate) fn unit_refs(&self) -> Vec<UnitRef> {
        self.units.clone()
    }
}

fn micros_to_seconds(micros: u64) -> f64 {
    micros as f64 / 1e6
}

/// Run `f` on every live unit in registration order.
pub(crate) fn drive(units: &[UnitRef], phase: &'static str, mut f: impl FnMut(&mut dyn Unit)) {
    for (index, slot) in units.iter().enumerate() {
        let Some(unit) = slot.upgrade() else {
            tracing::trace!(index, phase, "skipping dropped unit");
            continue;
        };
        match unit.try_borrow_mut() {
            Ok(mut guard) => f(&mut *guard),
            Err(_) => {
                tracing::error!(index, phase, "unit is borrowed by the host; skipped");
            }
        }
    }
}
