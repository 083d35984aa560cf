use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the strict (`try_*`) engine API.
///
/// The permissive API never returns these; it clamps or drops instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unit registry is full (capacity={capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("Value for {what} out of range: requested {requested}, would clamp to {applied}")]
    Clamped {
        what: &'static str,
        requested: f64,
        applied: f64,
    },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
