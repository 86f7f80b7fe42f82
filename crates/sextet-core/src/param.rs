//! Smoothed control values for zipper-free parameter changes.
//!
//! Knob moves arrive once per block; audio needs a value every sample. The two
//! smoothers here bridge that gap:
//!
//! - [`SmoothedParam`] - one-pole exponential approach (RC-like). Also used for
//!   glide and slew where only a per-sample coefficient is known.
//! - [`LinearSmoothedParam`] - constant-rate ramp that lands exactly on the
//!   target after the configured time.
//!
//! ```rust
//! use sextet_core::SmoothedParam;
//!
//! let mut level = SmoothedParam::with_config(0.0, 48000.0, 10.0);
//! level.set_target(1.0);
//! for _ in 0..2400 {
//!     level.advance();
//! }
//! assert!((level.get() - 1.0).abs() < 0.01);
//! ```

use libm::expf;

/// One-pole exponential smoother.
///
/// `y[n] = y[n-1] + coeff * (target - y[n-1])`
///
/// The coefficient is derived from a time constant in milliseconds
/// (`coeff = 1 - exp(-1 / (tau * sr))`) or set directly with
/// [`set_coefficient`](Self::set_coefficient). A coefficient of 1.0 means
/// instant changes.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    time_ms: f32,
}

impl SmoothedParam {
    /// Create an unsmoothed parameter at `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            time_ms: 0.0,
        }
    }

    /// Create a parameter smoothed with the given time constant.
    pub fn with_config(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.time_ms = time_ms;
        param.recalculate_coeff();
        param
    }

    /// Create a parameter that moves by a fixed fraction of the remaining
    /// distance each sample, independent of sample rate.
    pub fn with_coefficient(initial: f32, coeff: f32) -> Self {
        let mut param = Self::new(initial);
        param.set_coefficient(coeff);
        param
    }

    /// Set the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` with no transition.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update the sample rate, keeping the configured time constant.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the time constant in milliseconds. Zero disables smoothing.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Override the per-sample coefficient directly, clamped to `[0, 1]`.
    pub fn set_coefficient(&mut self, coeff: f32) {
        self.time_ms = 0.0;
        self.coeff = coeff.clamp(0.0, 1.0);
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Value being approached.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True once within 1e-6 of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    fn recalculate_coeff(&mut self) {
        let samples = self.time_ms * 0.001 * self.sample_rate;
        self.coeff = if samples <= 1.0 {
            1.0
        } else {
            1.0 - expf(-1.0 / samples)
        };
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Constant-rate ramp toward a target.
///
/// Each call to [`set_target`](Self::set_target) schedules a ramp that lasts
/// exactly the configured transition time, then lands on the target.
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
    sample_rate: f32,
    time_ms: f32,
}

impl LinearSmoothedParam {
    /// Create a ramp with a 10 ms default transition.
    pub fn new(initial: f32) -> Self {
        Self::with_config(initial, 48000.0, 10.0)
    }

    /// Create with an explicit sample rate and transition time.
    pub fn with_config(initial: f32, sample_rate: f32, time_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            remaining: 0,
            sample_rate,
            time_ms,
        }
    }

    /// Start a ramp toward `target`. Re-setting the same target is a no-op.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        let samples = (self.time_ms * 0.001 * self.sample_rate) as u32;
        if samples == 0 {
            self.set_immediate(target);
        } else {
            self.step = (target - self.current) / samples as f32;
            self.remaining = samples;
        }
    }

    /// Jump to `value` and cancel any ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Update the sample rate used for future ramps.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Advance one sample and return the new value.
    ///
    /// Each value is measured back from the target rather than accumulated,
    /// so the ramp cannot drift past it.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = self.target - self.step * self.remaining as f32;
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Ramp destination.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True when no ramp is in progress.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }
}

impl Default for LinearSmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
