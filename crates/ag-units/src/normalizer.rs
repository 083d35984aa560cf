//! Normalizer unit.
//!
//! Maps an arbitrary input stream onto a target distribution: every `put`
//! folds the sample into [`RunningStats`], takes its standard score and
//! rescales it as `score * stddev + mean`. The target is the distribution of
//! the *output*; nothing is assumed about the input range.

use ag_core::{Getter, Putter, Unit, ensure_finite};

use crate::error::{UnitError, UnitResult};
use crate::stats::RunningStats;

/// Default output mean.
pub const DEFAULT_MEAN: f64 = 0.5;

/// Default output standard deviation.
pub const DEFAULT_STDDEV: f64 = 0.25;

/// Remaps its input to a target mean and spread using running statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    stats: RunningStats,
    value: f64,
    mean: f64,
    stddev: f64,
}

impl Normalizer {
    /// Create a normalizer; the sign of `stddev` is ignored.
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self {
            stats: RunningStats::new(),
            value: mean,
            mean,
            stddev: stddev.abs(),
        }
    }

    /// Strict constructor rejecting negative or non-finite parameters.
    pub fn try_new(mean: f64, stddev: f64) -> UnitResult<Self> {
        ensure_finite(mean, "mean")?;
        ensure_finite(stddev, "stddev")?;
        if stddev < 0.0 {
            return Err(UnitError::Clamped {
                what: "stddev",
                requested: stddev,
                applied: stddev.abs(),
            });
        }
        Ok(Self::new(mean, stddev))
    }

    /// Target output mean.
    pub fn target_mean(&self) -> f64 {
        self.mean
    }

    /// Target output standard deviation (always non-negative).
    pub fn target_stddev(&self) -> f64 {
        self.stddev
    }

    /// Statistics of the input stream seen so far.
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Forget the input history; output returns to the target mean.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.value = self.mean;
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MEAN, DEFAULT_STDDEV)
    }
}

// Reacts to `put` only; nothing to do on setup or per step.
impl Unit for Normalizer {}

impl Getter for Normalizer {
    fn get(&self) -> f64 {
        self.value
    }
}

impl Putter for Normalizer {
    fn put(&mut self, value: f64) -> f64 {
        self.value = self.stats.update(value) * self.stddev + self.mean;
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let norm = Normalizer::default();
        assert_eq!(norm.target_mean(), 0.5);
        assert_eq!(norm.target_stddev(), 0.25);
        assert_eq!(norm.get(), 0.5, "output starts at the target mean");
    }

    #[test]
    fn constant_stream_converges_to_mean() {
        let mut norm = Normalizer::new(10.0, 2.0);
        for _ in 0..10_000 {
            norm.put(3.7);
        }
        assert!((norm.get() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn negative_spread_is_magnitude() {
        let mut a = Normalizer::new(1.0, -3.0);
        let mut b = Normalizer::new(1.0, 3.0);
        assert_eq!(a.target_stddev(), 3.0);
        for x in [0.0, 5.0, -2.0, 8.5, 1.25, 3.0] {
            assert_eq!(a.put(x), b.put(x));
        }
    }

    #[test]
    fn output_tracks_target_distribution() {
        // Alternating input has mean 0.5 and stddev 0.5 in the long run, so
        // the highs land one target stddev above the target mean.
        let mut norm = Normalizer::new(100.0, 10.0);
        let mut last_high = 0.0;
        for i in 0..2_000 {
            let out = norm.put(if i % 2 == 0 { 0.0 } else { 1.0 });
            if i % 2 == 1 {
                last_high = out;
            }
        }
        assert!((last_high - 110.0).abs() < 0.1);
    }

    #[test]
    fn digital_input() {
        let mut norm = Normalizer::new(0.0, 1.0);
        norm.put_on(false);
        let out = norm.put_on(true);
        assert!(out > 0.0);
        assert!(norm.is_on() == (out >= 0.5));
    }

    #[test]
    fn reset_restores_mean() {
        let mut norm = Normalizer::new(0.2, 1.0);
        norm.put(1.0);
        norm.put(4.0);
        norm.reset();
        assert_eq!(norm.get(), 0.2);
        assert_eq!(norm.stats().n_samples(), 0);
    }

    #[test]
    fn strict_constructor() {
        assert!(matches!(
            Normalizer::try_new(0.5, -0.25),
            Err(UnitError::Clamped { applied, .. }) if applied == 0.25
        ));
        assert!(matches!(
            Normalizer::try_new(f64::NAN, 0.25),
            Err(UnitError::NonFinite { what: "mean", .. })
        ));
        assert_eq!(Normalizer::try_new(0.5, 0.25).unwrap(), Normalizer::default());
    }
}
