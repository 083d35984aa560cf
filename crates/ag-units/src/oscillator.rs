//! Triangle/sawtooth oscillator.
//!
//! The output is a pure function of engine elapsed time, so it never drifts
//! with the step rate:
//!
//! ```text
//!   value
//!   1.0 ┤      ╱╲            ╱╲
//!       │     ╱  ╲          ╱  ╲
//!       │    ╱    ╲        ╱    ╲
//!   0.0 ┼───╱──────╲──────╱──────╲──→ t
//!       start  w·p   p
//! ```
//!
//! - rising edge `t / (w·p)` on `[0, w·p)`
//! - falling edge `(p − t) / ((1 − w)·p)` on `[w·p, p)`
//! - `w = 1` is a rising sawtooth, `w = 0` a falling one
//!
//! When elapsed time passes the end of the current period, the period start
//! jumps forward by a whole number of periods, so long gaps between steps do
//! not accumulate phase error.

use ag_core::{Getter, StepCtx, Unit, clamp_min, ensure_finite};

use crate::error::{UnitError, UnitResult};

/// Smallest accepted period (seconds). Shorter requests clamp to this.
pub const MIN_PERIOD: f64 = 1e-6;

/// Default period (seconds).
pub const DEFAULT_PERIOD: f64 = 1.0;

/// Default width (symmetric triangle).
pub const DEFAULT_WIDTH: f64 = 0.5;

/// Triangle/sawtooth oscillator with output in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriOsc {
    value: f64,
    period: f64,
    width: f64,
    /// Engine time at which the current period started (seconds).
    start_time: f64,
}

impl TriOsc {
    /// Create an oscillator; `period` and `width` are clamped like their setters.
    pub fn new(period: f64, width: f64) -> Self {
        let mut osc = Self {
            value: 0.0,
            period: DEFAULT_PERIOD,
            width: DEFAULT_WIDTH,
            start_time: 0.0,
        };
        osc.set_period(period).set_width(width);
        osc
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.set_period(period);
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.set_width(width);
        self
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.set_frequency(frequency);
        self
    }

    /// Set the period in seconds; non-positive or NaN clamps to [`MIN_PERIOD`].
    pub fn set_period(&mut self, period: f64) -> &mut Self {
        self.period = clamp_min(period, MIN_PERIOD);
        if self.period != period {
            tracing::debug!(requested = period, applied = self.period, "period clamped");
        }
        self
    }

    /// Set the frequency in Hz (sugar for `set_period(1 / frequency)`).
    pub fn set_frequency(&mut self, frequency: f64) -> &mut Self {
        self.set_period(1.0 / frequency)
    }

    /// Set the peak position as a fraction of the period, clamped to `[0, 1]`.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        self.width = if width.is_nan() {
            DEFAULT_WIDTH
        } else {
            width.clamp(0.0, 1.0)
        };
        if self.width != width {
            tracing::debug!(requested = width, applied = self.width, "width clamped");
        }
        self
    }

    /// Strict form of [`TriOsc::set_period`].
    pub fn try_set_period(&mut self, period: f64) -> UnitResult<&mut Self> {
        ensure_finite(period, "period")?;
        if period < MIN_PERIOD {
            return Err(UnitError::Clamped {
                what: "period",
                requested: period,
                applied: MIN_PERIOD,
            });
        }
        Ok(self.set_period(period))
    }

    /// Strict form of [`TriOsc::set_width`].
    pub fn try_set_width(&mut self, width: f64) -> UnitResult<&mut Self> {
        ensure_finite(width, "width")?;
        if !(0.0..=1.0).contains(&width) {
            return Err(UnitError::Clamped {
                what: "width",
                requested: width,
                applied: width.clamp(0.0, 1.0),
            });
        }
        Ok(self.set_width(width))
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn frequency(&self) -> f64 {
        1.0 / self.period
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Engine time at which the current period started.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Waveform value at time `t` into a period, `t` in `[0, period)`.
    fn shape(&self, t: f64) -> f64 {
        let phase = (t / self.period).clamp(0.0, 1.0);
        let value = if phase < self.width {
            phase / self.width
        } else if self.width < 1.0 {
            (1.0 - phase) / (1.0 - self.width)
        } else {
            // width == 1 and phase == 1 only through rounding: end of the ramp.
            1.0
        };
        value.clamp(0.0, 1.0)
    }
}

impl Default for TriOsc {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_WIDTH)
    }
}

impl Unit for TriOsc {
    fn setup(&mut self, ctx: &StepCtx) {
        self.start_time = ctx.seconds;
        self.value = self.shape(0.0);
    }

    fn update(&mut self, ctx: &StepCtx) {
        let mut t = ctx.seconds - self.start_time;
        if t >= self.period {
            self.start_time += (t / self.period).floor() * self.period;
            // Rounding can land the new start a hair past now, or a full
            // period short of it.
            if self.start_time > ctx.seconds {
                self.start_time -= self.period;
            } else if ctx.seconds - self.start_time >= self.period {
                self.start_time += self.period;
            }
            t = ctx.seconds - self.start_time;
        }
        self.value = self.shape(t);
    }
}

impl Getter for TriOsc {
    /// Current value in `[0, 1]`.
    fn get(&self) -> f64 {
        self.value
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn at(seconds: f64) -> StepCtx {
        StepCtx {
            seconds,
            step: 1,
            sample_rate: f64::MAX,
            target_sample_rate: None,
        }
    }

    /// Value of a fresh oscillator anchored at zero, read at `t`.
    fn value_at(period: f64, width: f64, t: f64) -> f64 {
        let mut osc = TriOsc::new(period, width);
        osc.setup(&at(0.0));
        osc.update(&at(t));
        osc.get()
    }

    proptest! {
        #[test]
        fn output_stays_in_unit_range(
            period in 0.01_f64..10.0,
            width in 0.0_f64..=1.0,
            times in prop::collection::vec(0.0_f64..100.0, 1..50),
        ) {
            let mut times = times;
            times.sort_by(|a, b| a.total_cmp(b));

            let mut osc = TriOsc::new(period, width);
            osc.setup(&at(0.0));
            for t in times {
                osc.update(&at(t));
                prop_assert!((0.0..=1.0).contains(&osc.get()));
                prop_assert!(osc.start_time() <= t + 1e-9);
            }
        }

        #[test]
        fn output_is_periodic(period in 0.1_f64..5.0, width in 0.05_f64..0.95, t in 0.0_f64..5.0, k in 1_u32..20) {
            let mut a = TriOsc::new(period, width);
            a.setup(&at(0.0));
            a.update(&at(t));

            let mut b = TriOsc::new(period, width);
            b.setup(&at(0.0));
            b.update(&at(t + k as f64 * period));

            // Away from the wrap point the two readings match; near it the
            // value is close to zero on both sides of the seam.
            let phase = (t / period).fract();
            if phase > 1e-6 && phase < 1.0 - 1e-6 {
                prop_assert!((a.get() - b.get()).abs() < 1e-6);
            }
        }

        #[test]
        fn output_is_continuous(
            period in 0.1_f64..5.0,
            width in 0.05_f64..0.95,
            t in 0.0_f64..20.0,
            delta in 1e-6_f64..1e-2,
        ) {
            let slope = 1.0 / (width * period).min((1.0 - width) * period);
            let a = value_at(period, width, t);
            let b = value_at(period, width, t + delta);
            prop_assert!((b - a).abs() <= slope * delta + 1e-9);
        }

        #[test]
        fn continuous_across_peak_and_seam(
            period in 0.1_f64..5.0,
            width in 0.05_f64..0.95,
            k in 0_u32..10,
            delta in 1e-6_f64..1e-3,
        ) {
            let slope = 1.0 / (width * period).min((1.0 - width) * period);
            let base = k as f64 * period;
            for edge in [base + width * period, base + period] {
                let before = value_at(period, width, edge - delta);
                let after = value_at(period, width, edge + delta);
                prop_assert!((after - before).abs() <= slope * 2.0 * delta + 1e-9);
            }
        }
    }
}
