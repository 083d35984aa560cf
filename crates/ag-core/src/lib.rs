//! ag-core: runtime core for analog control graphs.
//!
//! Contains:
//! - unit (the setup/update contract plus getter/putter refinements)
//! - engine (fixed-capacity registry, elapsed-time model, sample-rate policy)
//! - platform (injected clock + serial capability)
//! - config (engine configuration)
//! - ids (compact registry handles)
//! - numeric (tolerances + float helpers)
//! - error (shared error types)
//! - global (per-thread default engine)

pub mod config;
pub mod engine;
pub mod error;
pub mod global;
pub mod ids;
pub mod numeric;
pub mod platform;
pub mod unit;

// Re-exports: nice ergonomics for downstream crates
pub use config::EngineConfig;
pub use engine::{Engine, EngineState, MIN_SAMPLE_RATE};
pub use error::{EngineError, EngineResult};
pub use ids::UnitId;
pub use numeric::*;
pub use platform::{Platform, SimPlatform, StdPlatform};
pub use unit::{Getter, Putter, Shared, StepCtx, Unit, analog_to_digital, digital_to_analog};
