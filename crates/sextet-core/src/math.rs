//! Mathematical utility functions for DSP.
//!
//! Small, allocation-free helpers shared by the oscillator, filter, and
//! effect code. All functions are `no_std` and safe to call per sample.
//!
//! # Waveshaping
//!
//! - [`soft_clip`] - `tanh` saturation, used as the voice output stage
//! - [`fast_tanh`] - alias used inside filter feedback paths
//!
//! # Safety Nets
//!
//! - [`sanitize`] - replace NaN/Inf with silence
//! - [`flush_denormal`] - zero out subnormal-range values in feedback loops
//!
//! # Utilities
//!
//! - [`lerp`] - Linear interpolation
//! - [`wet_dry_mix`] - Dry/wet crossfade
//! - [`semitones_to_ratio`] / [`cents_to_ratio`] - Pitch offsets to frequency ratios

use libm::{exp2f, tanhf};

/// Hyperbolic tangent for filter saturation.
///
/// Uses the actual tanh function from libm for accuracy.
///
/// # Returns
/// tanh(x), in range (-1, 1)
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    tanhf(x)
}

/// Soft clip using hyperbolic tangent.
///
/// Smooth saturation that approaches ±1 asymptotically.
/// Produces primarily odd harmonics.
///
/// # Returns
/// Soft-clipped output in range (-1, 1)
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Replace non-finite values with silence.
///
/// Every per-sample output path runs through this before leaving a voice or
/// the engine, so a NaN produced anywhere upstream becomes a single silent
/// sample instead of poisoning the rest of the chain.
///
/// # Example
/// ```rust
/// use sextet_core::sanitize;
///
/// assert_eq!(sanitize(0.5), 0.5);
/// assert_eq!(sanitize(f32::NAN), 0.0);
/// assert_eq!(sanitize(f32::INFINITY), 0.0);
/// ```
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() { x } else { 0.0 }
}

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (t = 0)
/// * `b` - End value (t = 1)
/// * `t` - Interpolation factor
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Flush denormal (subnormal) floats to zero.
///
/// Denormal numbers cause significant CPU performance degradation on most
/// architectures. This function replaces values below 1e-20 with zero,
/// providing margin before the IEEE 754 subnormal range begins.
///
/// Use this in feedback loops (filters, delay lines) where signal can decay
/// indefinitely toward zero.
///
/// Reference: IEEE 754-2008, Section 3.4 (Subnormal numbers)
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals.
///
/// Equivalent to `dry * (1 - mix) + wet * mix` but uses one fewer multiply:
/// `dry + (wet - dry) * mix`.
///
/// # Arguments
///
/// * `dry` - Unprocessed signal
/// * `wet` - Processed signal
/// * `mix` - Blend factor in \[0.0, 1.0\]: 0.0 = all dry, 1.0 = all wet
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

/// Convert a pitch offset in semitones to a frequency ratio.
///
/// `ratio = 2^(semitones / 12)`
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Convert a pitch offset in cents to a frequency ratio.
///
/// `ratio = 2^(cents / 1200)`
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    semitones_to_ratio(cents / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_clip_bounds() {
        for &x in &[-100.0, -2.0, -0.5, 0.0, 0.5, 2.0, 100.0] {
            let y = soft_clip(x);
            assert!(y.abs() <= 1.0, "soft_clip({}) = {} out of range", x, y);
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(-0.25), -0.25);
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
    }

    #[test]
    fn test_wet_dry_mix() {
        assert_eq!(wet_dry_mix(1.0, 0.0, 0.0), 1.0);
        assert_eq!(wet_dry_mix(1.0, 0.0, 1.0), 0.0);
        assert!((wet_dry_mix(1.0, -1.0, 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_ratios() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-5);
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-5);
        assert!((cents_to_ratio(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(-1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
