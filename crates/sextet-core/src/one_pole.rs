//! One-pole (6 dB/oct) filter with lowpass and highpass taps.
//!
//! ```text
//! lp[n] = x[n] + coeff * (lp[n-1] - x[n])
//! hp[n] = x[n] - lp[n]
//! ```
//!
//! with `coeff = exp(-2π · freq / sample_rate)`. Used to colour noise (chorus
//! hiss) and to take the edge off control signals.
//!
//! ```rust
//! use sextet_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! assert!(lp.process(1.0) < 1.0);
//! ```
//!
//! Reference: J. O. Smith III, "Introduction to Digital Filters", One-Pole Filter.

use crate::flush_denormal;
use libm::expf;

/// One-pole filter.
///
/// `coeff` stays in `[0, 1)` for any positive frequency below Nyquist, so the
/// filter is unconditionally stable.
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a filter with cutoff `freq_hz`.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate: sample_rate.max(1.0),
            freq: freq_hz,
        };
        filter.update_coeff();
        filter
    }

    /// Move the cutoff.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.update_coeff();
    }

    /// Change the sample rate, keeping the cutoff in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_coeff();
    }

    /// Lowpass output for one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Highpass output for one sample (input minus the lowpass).
    #[inline]
    pub fn process_highpass(&mut self, input: f32) -> f32 {
        input - self.process(input)
    }

    /// Clear the filter memory.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn update_coeff(&mut self) {
        let freq = self.freq.clamp(0.0, self.sample_rate * 0.5);
        self.coeff = expf(-core::f32::consts::TAU * freq / self.sample_rate);
    }
}
