//! Four-pole (24 dB/oct) ladder low-pass, topology-preserving transform.
//!
//! Four cascaded trapezoidal one-poles with global negative feedback from the
//! last stage. The zero-delay feedback loop is solved in closed form:
//!
//! ```text
//! g = tan(π fc / fs),  G = g / (1 + g)
//! S = (G³ s1 + G² s2 + G s3 + s4) / (1 + g)
//! u = (x − k S) / (1 + k G⁴)
//! ```
//!
//! `u` is then saturated with `tanh(drive · u) / drive`, which keeps small
//! signals linear and bounds self-oscillation once `k` passes 4.
//!
//! Cutoff uses [`fast_tan`] below 10 kHz and `libm::tanf` above, like the
//! other prewarped filters in this crate.
//!
//! Reference: V. Zavalishin, "The Art of VA Filter Design", ch. 5.

use crate::Effect;
use crate::fast_math::fast_tan;
use crate::math::{fast_tanh, flush_denormal};
use core::f32::consts::PI;
use libm::tanf;

/// Feedback gain at resonance 1.0. Four is the analytic self-oscillation edge.
const FEEDBACK_AT_FULL_RESONANCE: f32 = 3.9;

/// Passband loss compensation per unit of feedback.
const GAIN_COMPENSATION: f32 = 0.5;

/// Ladder low-pass with input drive.
///
/// ```rust
/// use sextet_core::{Effect, LadderFilter};
///
/// let mut vcf = LadderFilter::new(48000.0);
/// vcf.set_cutoff(800.0);
/// vcf.set_resonance(0.5);
/// let y = vcf.process(0.25);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    drive: f32,
    g: f32,
    big_g: f32,
    k: f32,
    stages: [f32; 4],
}

impl LadderFilter {
    /// Filter fully open with no resonance and unity drive.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate.max(1.0),
            cutoff: 20_000.0,
            resonance: 0.0,
            drive: 1.0,
            g: 0.0,
            big_g: 0.0,
            k: 0.0,
            stages: [0.0; 4],
        };
        filter.update_coefficients();
        filter
    }

    /// Set cutoff in Hz, clamped to `[5, 0.45 · fs]`.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff = cutoff_hz.clamp(5.0, self.sample_rate * 0.45);
        self.update_coefficients();
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance in `[0, 1.05]`; values slightly above 1 self-oscillate.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.05);
        self.k = self.resonance * FEEDBACK_AT_FULL_RESONANCE;
    }

    /// Current resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set input drive (at least 0.1).
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.max(0.1);
    }

    fn update_coefficients(&mut self) {
        let arg = PI * self.cutoff / self.sample_rate;
        self.g = if self.cutoff < 10_000.0 {
            fast_tan(arg)
        } else {
            tanf(arg)
        };
        self.big_g = self.g / (1.0 + self.g);
    }
}

impl Effect for LadderFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let g1 = self.big_g;
        let g2 = g1 * g1;
        let g3 = g2 * g1;
        let g4 = g2 * g2;
        let beta = 1.0 / (1.0 + self.g);
        let [s1, s2, s3, s4] = self.stages;

        let sigma = (g3 * s1 + g2 * s2 + g1 * s3 + s4) * beta;
        let u = (input - self.k * sigma) / (1.0 + self.k * g4);
        let mut x = fast_tanh(u * self.drive) / self.drive;

        for s in &mut self.stages {
            let v = (x - *s) * g1;
            let y = v + *s;
            *s = flush_denormal(y + v);
            x = y;
        }

        x * (1.0 + GAIN_COMPENSATION * self.k)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.set_cutoff(self.cutoff);
    }

    fn reset(&mut self) {
        self.stages = [0.0; 4];
    }
}
