//! Error types for the strict unit setters.

use thiserror::Error;

/// Result type for strict unit operations.
pub type UnitResult<T> = Result<T, UnitError>;

/// Errors surfaced by `try_*` constructors and setters.
///
/// The permissive counterparts clamp instead of returning these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    /// Value would have been clamped by the permissive setter.
    #[error("Value for {what} out of range: requested {requested}, would clamp to {applied}")]
    Clamped {
        what: &'static str,
        requested: f64,
        applied: f64,
    },

    /// NaN or infinite input.
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// Engine error with no unit-level counterpart.
    #[error("Engine error: {0}")]
    Engine(ag_core::EngineError),
}

impl From<ag_core::EngineError> for UnitError {
    fn from(e: ag_core::EngineError) -> Self {
        match e {
            ag_core::EngineError::Clamped {
                what,
                requested,
                applied,
            } => UnitError::Clamped {
                what,
                requested,
                applied,
            },
            ag_core::EngineError::NonFinite { what, value } => UnitError::NonFinite { what, value },
            other @ ag_core::EngineError::CapacityExceeded { .. } => UnitError::Engine(other),
        }
    }
}
