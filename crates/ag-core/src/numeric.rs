use crate::EngineError;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, EngineError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EngineError::NonFinite { what, value: v })
    }
}

/// Clamp `v` to at least `floor`, mapping NaN to `floor` as well.
///
/// `f64::max` already returns the non-NaN operand, which is what the
/// permissive setters rely on.
pub fn clamp_min(v: f64, floor: f64) -> f64 {
    v.max(floor)
}
