//! Online running statistics.
//!
//! Mean and variance are tracked incrementally with Welford's update, one
//! sample per call, so nothing is ever recomputed from history:
//!
//! ```text
//! n     += 1
//! delta  = x - mean
//! mean  += delta / n
//! m2    += delta * (x - mean)
//! var    = m2 / n
//! ```
//!
//! The normalized score of a sample is its distance to the running mean in
//! units of running standard deviation. A constant stream has zero variance,
//! so its score collapses to exactly zero.

/// Added to the standard deviation before dividing, so the score stays finite.
pub const STATS_EPSILON: f64 = 1e-12;

/// Running mean/variance estimator with a standard-score output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunningStats {
    n_samples: u64,
    mean: f64,
    m2: f64,
    last_value: f64,
    last_normalized: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `value` into the statistics and return its normalized score.
    pub fn update(&mut self, value: f64) -> f64 {
        self.n_samples += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n_samples as f64;
        self.m2 += delta * (value - self.mean);

        self.last_value = value;
        self.last_normalized = self.normalize(value);
        self.last_normalized
    }

    /// Score of `value` against the current statistics, without updating them.
    pub fn normalize(&self, value: f64) -> f64 {
        let stddev = self.stddev();
        if stddev <= 0.0 {
            return 0.0;
        }
        (value - self.mean) / (stddev + STATS_EPSILON)
    }

    /// Clear all accumulated state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, never negative.
    pub fn var(&self) -> f64 {
        if self.n_samples < 2 {
            return 0.0;
        }
        (self.m2 / self.n_samples as f64).max(0.0)
    }

    pub fn stddev(&self) -> f64 {
        self.var().sqrt()
    }

    pub fn n_samples(&self) -> u64 {
        self.n_samples
    }

    /// Last raw sample passed to `update`.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Score returned by the last `update`.
    pub fn last_normalized(&self) -> f64 {
        self.last_normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats() {
        let stats = RunningStats::new();
        assert_eq!(stats.n_samples(), 0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.var(), 0.0);
        assert_eq!(stats.normalize(3.0), 0.0);
    }

    #[test]
    fn first_sample_scores_zero() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.update(42.0), 0.0);
        assert_eq!(stats.mean(), 42.0);
        assert_eq!(stats.last_value(), 42.0);
    }

    #[test]
    fn matches_batch_statistics() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = RunningStats::new();
        for s in samples {
            stats.update(s);
        }
        assert!((stats.mean() - 5.0).abs() < 1e-9);
        assert!((stats.var() - 4.0).abs() < 1e-9);
        assert!((stats.stddev() - 2.0).abs() < 1e-9);
        // Last sample 9.0 is two standard deviations above the mean.
        assert!((stats.last_normalized() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn constant_stream_collapses() {
        let mut stats = RunningStats::new();
        for _ in 0..1_000 {
            assert_eq!(stats.update(0.3), 0.0);
        }
        assert_eq!(stats.var(), 0.0);
    }

    #[test]
    fn reset_clears() {
        let mut stats = RunningStats::new();
        stats.update(1.0);
        stats.update(3.0);
        stats.reset();
        assert_eq!(stats, RunningStats::new());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn variance_never_negative(samples in prop::collection::vec(-1e6_f64..1e6, 1..200)) {
            let mut stats = RunningStats::new();
            for s in &samples {
                let score = stats.update(*s);
                prop_assert!(score.is_finite());
                prop_assert!(stats.var() >= 0.0);
            }
            let batch_mean = samples.iter().sum::<f64>() / samples.len() as f64;
            prop_assert!((stats.mean() - batch_mean).abs() <= 1e-6 * (1.0 + batch_mean.abs()));
        }
    }
}
