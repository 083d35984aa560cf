//! Integration test: engine lifecycle against both platforms.
//!
//! Checks:
//! - producer/consumer wiring between steps sees registration order
//! - step counter resets only on initialize
//! - wall-clock pacing never returns early

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use ag_core::{
    Engine, EngineConfig, EngineState, Getter, Putter, SimPlatform, StdPlatform, StepCtx, Unit,
};

/// Ramps by one each step.
struct Ramp {
    value: f64,
}

impl Unit for Ramp {
    fn setup(&mut self, _ctx: &StepCtx) {
        self.value = 0.0;
    }

    fn update(&mut self, _ctx: &StepCtx) {
        self.value += 1.0;
    }
}

impl Getter for Ramp {
    fn get(&self) -> f64 {
        self.value
    }
}

/// Doubles whatever is put into it.
struct Doubler {
    value: f64,
}

impl Unit for Doubler {}

impl Getter for Doubler {
    fn get(&self) -> f64 {
        self.value
    }
}

impl Putter for Doubler {
    fn put(&mut self, value: f64) -> f64 {
        self.value = value * 2.0;
        self.value
    }
}

#[test]
fn host_wires_units_between_steps() {
    let clock = SimPlatform::new();
    let mut engine = Engine::with_platform(clock.clone());
    let ramp = engine.spawn(Ramp { value: 42.0 });
    let doubler = engine.spawn(Doubler { value: 0.0 });

    engine.initialize();
    assert_eq!(ramp.borrow().get(), 0.0, "setup resets the ramp");

    for n in 1..=5 {
        clock.advance_micros(1_000);
        engine.step();
        let produced = ramp.borrow().get();
        let consumed = doubler.borrow_mut().put(produced);
        assert_eq!(produced, n as f64);
        assert_eq!(consumed, 2.0 * n as f64);
    }
}

#[test]
fn counter_resets_only_on_initialize() {
    let clock = SimPlatform::new();
    let mut engine = Engine::with_platform(clock.clone());
    engine.initialize();
    for _ in 0..7 {
        engine.step();
    }
    engine.set_sample_rate(1_000.0);
    engine.enable_auto_sample_rate();
    assert_eq!(engine.n_steps(), 7);

    engine.initialize();
    assert_eq!(engine.n_steps(), 0);
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn trait_objects_register_by_identity() {
    let journal: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    struct Tag(u32, Rc<RefCell<Vec<u32>>>);
    impl Unit for Tag {
        fn update(&mut self, _ctx: &StepCtx) {
            self.1.borrow_mut().push(self.0);
        }
    }

    let clock = SimPlatform::new();
    let mut engine = Engine::new(clock, EngineConfig::default().with_capacity(3));
    let units: Vec<_> = (0..5)
        .map(|i| Rc::new(RefCell::new(Tag(i, journal.clone()))))
        .collect();
    for unit in units.iter().chain(units.iter()) {
        engine.add(unit);
    }
    assert_eq!(engine.len(), 3);

    engine.initialize();
    engine.step();
    assert_eq!(*journal.borrow(), [0, 1, 2]);
}

#[test]
fn wall_clock_pacing_holds_the_rate() {
    let mut engine = Engine::new(StdPlatform::new(), EngineConfig::default().with_sample_rate(200.0));
    engine.initialize();

    let start = Instant::now();
    for _ in 0..4 {
        engine.step();
    }
    // Four paced steps at 200 Hz need at least 20 ms of real time.
    assert!(start.elapsed().as_secs_f64() >= 0.019);
    assert!((engine.seconds(false) - 0.02).abs() < 1e-9);
}
