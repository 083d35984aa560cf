//! Per-thread default engine.
//!
//! Sketch-style programs can skip threading an [`Engine`] through their code
//! and use these free functions instead. Each thread gets its own wall-clock
//! engine with the default configuration, created on first use.
//!
//! ```
//! use ag_core::{global, StepCtx, Unit};
//!
//! struct Blink;
//! impl Unit for Blink {
//!     fn update(&mut self, _ctx: &StepCtx) {}
//! }
//!
//! let _blink = global::spawn(Blink);
//! global::begin();
//! global::step();
//! assert_eq!(global::n_steps(), 1);
//! ```

use std::cell::RefCell;

use crate::engine::{Engine, EngineState, drive};
use crate::ids::UnitId;
use crate::platform::StdPlatform;
use crate::unit::{Shared, Unit};

thread_local! {
    static ENGINE: RefCell<Engine<StdPlatform>> = RefCell::new(Engine::default());
}

/// Run `f` against this thread's default engine.
///
/// The engine is borrowed for the duration of `f`, so `f` must not call back
/// into this module. [`begin`] and [`step`] release the borrow while units run,
/// which lets `setup` and `update` use the free functions here.
pub fn with<R>(f: impl FnOnce(&mut Engine<StdPlatform>) -> R) -> R {
    ENGINE.with(|engine| f(&mut engine.borrow_mut()))
}

pub fn add<U: Unit + 'static>(unit: &Shared<U>) -> Option<UnitId> {
    with(|engine| engine.add(unit))
}

pub fn spawn<U: Unit + 'static>(unit: U) -> Shared<U> {
    with(|engine| engine.spawn(unit))
}

/// Initialize the default engine.
pub fn begin() {
    let (ctx, units) = with(|engine| (engine.reset(), engine.unit_refs()));
    drive(&units, "setup", |unit| unit.setup(&ctx));
    with(|engine| engine.start_clock());
}

pub fn step() {
    if with(|engine| engine.state()) == EngineState::Uninitialized {
        tracing::warn!("step() called before begin(); initializing now");
        begin();
    }
    let (ctx, units) = with(|engine| (engine.advance(), engine.unit_refs()));
    drive(&units, "update", |unit| unit.update(&ctx));
}

pub fn n_steps() -> u64 {
    with(|engine| engine.n_steps())
}

pub fn seconds(real_time: bool) -> f64 {
    with(|engine| engine.seconds(real_time))
}

pub fn sample_rate() -> f64 {
    with(|engine| engine.sample_rate())
}

pub fn set_sample_rate(rate: f64) {
    with(|engine| engine.set_sample_rate(rate))
}

pub fn enable_auto_sample_rate() {
    with(|engine| engine.enable_auto_sample_rate())
}

pub fn auto_sample_rate() -> bool {
    with(|engine| engine.auto_sample_rate())
}
