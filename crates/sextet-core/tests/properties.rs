//! Property-based tests for sextet-core DSP primitives.
//!
//! Filter stability, smoother convergence and delay line integrity under
//! randomized inputs.

use proptest::prelude::*;
use sextet_core::{
    Biquad, BiquadCoefficients, DelayLine, Effect, LadderFilter, LinearSmoothedParam,
    SmoothedParam,
};

/// Designs indexed 0..4 (LP, HP, peak, low shelf).
fn design(variant: usize, freq: f32, q: f32, gain_db: f32) -> BiquadCoefficients {
    let sr = 48000.0;
    match variant % 4 {
        0 => BiquadCoefficients::lowpass(freq, q, sr),
        1 => BiquadCoefficients::highpass(freq, q, sr),
        2 => BiquadCoefficients::peaking(freq, q, gain_db, sr),
        _ => BiquadCoefficients::low_shelf(freq, q, gain_db, sr),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every biquad design stays finite for bounded input.
    #[test]
    fn biquad_stability(
        freq in 5.0f32..24000.0f32,
        q in 0.1f32..10.0f32,
        gain_db in -24.0f32..24.0f32,
        variant in 0usize..4,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut biquad = Biquad::with_coefficients(design(variant, freq, q, gain_db));
        for _ in 0..32 {
            for &x in &input {
                let y = biquad.process(x);
                prop_assert!(y.is_finite(), "variant {} freq {} q {} -> {}", variant, freq, q, y);
            }
        }
    }

    /// The ladder stays finite and bounded for any cutoff, resonance and drive,
    /// including self-oscillating settings.
    #[test]
    fn ladder_stability(
        cutoff in 5.0f32..22000.0f32,
        resonance in 0.0f32..=1.05f32,
        drive in 0.5f32..4.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut vcf = LadderFilter::new(48000.0);
        vcf.set_cutoff(cutoff);
        vcf.set_resonance(resonance);
        vcf.set_drive(drive);
        for _ in 0..64 {
            for &x in &input {
                let y = vcf.process(x);
                prop_assert!(y.is_finite() && y.abs() < 50.0, "cutoff {} res {} -> {}", cutoff, resonance, y);
            }
        }
    }

    /// Exponential smoothing converges for any start/target pair.
    #[test]
    fn smoothed_param_convergence(
        initial in -100.0f32..100.0f32,
        target in -100.0f32..100.0f32,
    ) {
        let mut param = SmoothedParam::with_config(initial, 48000.0, 10.0);
        param.set_target(target);
        for _ in 0..10_000 {
            param.advance();
        }
        // One-pole steps stall at roughly ULP(target) / coeff.
        let floor = target.abs() * f32::EPSILON / 0.002 + 1e-4;
        prop_assert!((param.get() - target).abs() < floor);
    }

    /// Linear ramps never overshoot and always land exactly.
    #[test]
    fn linear_ramp_is_monotonic(
        initial in -10.0f32..10.0f32,
        target in -10.0f32..10.0f32,
        time_ms in 0.0f32..50.0f32,
    ) {
        let mut param = LinearSmoothedParam::with_config(initial, 48000.0, time_ms);
        param.set_target(target);
        let rising = target >= initial;
        let mut prev = initial;
        for _ in 0..2401 {
            let v = param.advance();
            if rising {
                prop_assert!(v >= prev - 1e-5 && v <= target + 1e-5);
            } else {
                prop_assert!(v <= prev + 1e-5 && v >= target - 1e-5);
            }
            prev = v;
        }
        prop_assert_eq!(param.get(), target);
    }

    /// Integer-delay reads return exactly what was written.
    #[test]
    fn delay_line_integrity(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 1..=64),
    ) {
        let mut line = DelayLine::new(samples.len() + 2);
        for &s in &samples {
            line.write(s);
        }
        for (delay, &expected) in samples.iter().rev().enumerate() {
            prop_assert_eq!(line.read(delay as f32), expected);
        }
    }
}
