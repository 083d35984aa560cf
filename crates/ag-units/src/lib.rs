//! Signal units built on the ag-core unit contract.
//!
//! # Units
//!
//! - [`TriOsc`]: triangle/sawtooth oscillator driven by engine elapsed time
//! - [`Normalizer`]: remaps an arbitrary input stream onto a target mean/spread
//!
//! Both follow the same contract as any other unit: construct, register with
//! an engine, let the engine call `setup` once and `update` every step, and
//! read/write values through `get`/`put` between steps.
//!
//! [`RunningStats`] is the online mean/variance estimator behind the normalizer.

pub mod error;
pub mod normalizer;
pub mod oscillator;
pub mod stats;

pub use error::{UnitError, UnitResult};
pub use normalizer::Normalizer;
pub use oscillator::{MIN_PERIOD, TriOsc};
pub use stats::RunningStats;
