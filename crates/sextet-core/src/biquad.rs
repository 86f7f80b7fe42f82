//! Second-order IIR section with RBJ Audio EQ Cookbook designs.
//!
//! [`BiquadCoefficients`] holds a normalised design (`a0 = 1`); [`Biquad`]
//! runs it in transposed direct form II, which keeps two state words and
//! behaves well when coefficients change between samples.
//!
//! Designs provided: low-pass, high-pass, peaking EQ and low shelf. The synth
//! uses them for the voice high-pass/bass stage, the noise colouring peak and
//! the chorus reconstruction filter.
//!
//! ```rust
//! use sextet_core::{Biquad, BiquadCoefficients};
//!
//! let mut hpf = Biquad::new();
//! hpf.set_coefficients(BiquadCoefficients::highpass(225.0, 0.707, 48000.0));
//! let y = hpf.process(1.0);
//! assert!(y.is_finite());
//! ```

use crate::flush_denormal;
use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Normalised biquad coefficients.
///
/// ```text
/// H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward, current input.
    pub b0: f32,
    /// Feedforward, one sample back.
    pub b1: f32,
    /// Feedforward, two samples back.
    pub b2: f32,
    /// Feedback, one sample back.
    pub a1: f32,
    /// Feedback, two samples back.
    pub a2: f32,
}

/// Shared RBJ intermediates: `(cos ω, alpha)`.
fn rbj_prelude(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let nyquist_guard = sample_rate * 0.49;
    let omega = 2.0 * PI * frequency.clamp(1.0, nyquist_guard) / sample_rate;
    (cosf(omega), sinf(omega) / (2.0 * q.max(0.01)))
}

impl BiquadCoefficients {
    /// Pass-through (`H(z) = 1`).
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build from raw cookbook terms, dividing through by `a0`.
    pub fn from_raw(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// 12 dB/oct low-pass.
    pub fn lowpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let (cos_w, alpha) = rbj_prelude(frequency, q, sample_rate);
        let b1 = 1.0 - cos_w;
        Self::from_raw(b1 * 0.5, b1, b1 * 0.5, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
    }

    /// 12 dB/oct high-pass.
    pub fn highpass(frequency: f32, q: f32, sample_rate: f32) -> Self {
        let (cos_w, alpha) = rbj_prelude(frequency, q, sample_rate);
        let b1 = -(1.0 + cos_w);
        Self::from_raw(-b1 * 0.5, b1, -b1 * 0.5, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
    }

    /// Peaking bell, `gain_db` at `frequency`.
    pub fn peaking(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let (cos_w, alpha) = rbj_prelude(frequency, q, sample_rate);
        let a = powf(10.0, gain_db / 40.0);
        Self::from_raw(
            1.0 + alpha * a,
            -2.0 * cos_w,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w,
            1.0 - alpha / a,
        )
    }

    /// Low shelf with `gain_db` below `frequency`.
    pub fn low_shelf(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let (cos_w, alpha) = rbj_prelude(frequency, q, sample_rate);
        let a = powf(10.0, gain_db / 40.0);
        let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;
        Self::from_raw(
            a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
            a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
            (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
            (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
        )
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Biquad filter state (transposed direct form II).
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: BiquadCoefficients,
    s1: f32,
    s2: f32,
}

impl Biquad {
    /// A pass-through section.
    pub fn new() -> Self {
        Self::default()
    }

    /// A section starting from the given design.
    pub fn with_coefficients(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Swap in a new design without clearing state.
    pub fn set_coefficients(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current design.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let y = c.b0 * input + self.s1;
        self.s1 = flush_denormal(c.b1 * input - c.a1 * y + self.s2);
        self.s2 = flush_denormal(c.b2 * input - c.a2 * y);
        y
    }

    /// Clear the state, keeping the design.
    pub fn clear(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}
