//! First-order DC blocker.
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R z^-1),   R = 1 - 2π fc / fs
//! ```
//!
//! Sits at the very end of the engine so offsets from asymmetric saturation,
//! pulse-width changes and the bass shelf never reach the output.
//!
//! Reference: J. O. Smith III, "Introduction to Digital Filters", DC Blocker.

use crate::flush_denormal;
use core::f32::consts::PI;

/// DC blocking high-pass.
#[derive(Debug, Clone)]
pub struct DcBlocker {
    r: f32,
    cutoff_hz: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    /// Blocker with a 20 Hz corner.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_cutoff(sample_rate, 20.0)
    }

    /// Blocker with an explicit corner frequency.
    pub fn with_cutoff(sample_rate: f32, cutoff_hz: f32) -> Self {
        let mut blocker = Self {
            r: 0.0,
            cutoff_hz,
            x1: 0.0,
            y1: 0.0,
        };
        blocker.set_sample_rate(sample_rate);
        blocker
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let y = flush_denormal(input - self.x1 + self.r * self.y1);
        self.x1 = input;
        self.y1 = y;
        y
    }

    /// Recompute `R` for a new sample rate, keeping the corner in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let r = 1.0 - 2.0 * PI * self.cutoff_hz / sample_rate.max(1.0);
        self.r = r.clamp(0.9, 0.9999);
    }

    /// Pole radius `R`.
    pub fn coeff(&self) -> f32 {
        self.r
    }

    /// Clear the filter memory.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
