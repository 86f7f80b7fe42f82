//! Integration tests for sextet-core DSP primitives.
//!
//! Signal-level measurements: sine sweeps through the filters, delay
//! accuracy, and LFO shape.

use sextet_core::{
    Biquad, BiquadCoefficients, DelayLine, Effect, LadderFilter, Lfo, LfoWaveform, OnePole,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

fn generate_sine(freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / SAMPLE_RATE))
        .collect()
}

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

/// Gain in dB of an [`Effect`] at `freq_hz`, measured after settling.
fn measure_response(effect: &mut dyn Effect, freq_hz: f32) -> f32 {
    effect.reset();
    let mut signal = generate_sine(freq_hz, 9600);
    effect.process_block_inplace(&mut signal);
    let settled = &signal[4800..];
    to_db(rms(settled) / core::f32::consts::FRAC_1_SQRT_2)
}

#[test]
fn biquad_lowpass_is_minus_3db_at_cutoff() {
    let mut lp = Biquad::with_coefficients(BiquadCoefficients::lowpass(1000.0, 0.707, SAMPLE_RATE));
    let at_cutoff = measure_response(&mut lp, 1000.0);
    assert!((at_cutoff + 3.0).abs() < 0.5, "{at_cutoff} dB at cutoff");
    let stop = measure_response(&mut lp, 8000.0);
    assert!(stop < -30.0, "{stop} dB three octaves up");
}

#[test]
fn biquad_highpass_stages_match_voice_corners() {
    for corner in [10.0, 225.0, 450.0] {
        let mut hp = Biquad::with_coefficients(BiquadCoefficients::highpass(corner, 0.707, SAMPLE_RATE));
        let pass = measure_response(&mut hp, corner * 8.0);
        assert!(pass.abs() < 0.5, "{corner} Hz HPF passband {pass} dB");
    }
}

#[test]
fn low_shelf_boosts_bass_only() {
    let mut shelf = Biquad::with_coefficients(BiquadCoefficients::low_shelf(
        80.0,
        0.707,
        6.0206,
        SAMPLE_RATE,
    ));
    let low = measure_response(&mut shelf, 20.0);
    let high = measure_response(&mut shelf, 4000.0);
    assert!(low > 4.5, "shelf at 20 Hz {low} dB");
    assert!(high.abs() < 0.5, "shelf at 4 kHz {high} dB");
}

#[test]
fn ladder_rolls_off_24db_per_octave() {
    let mut vcf = LadderFilter::new(SAMPLE_RATE);
    vcf.set_cutoff(500.0);
    let one_octave = measure_response(&mut vcf, 2000.0);
    let two_octaves = measure_response(&mut vcf, 4000.0);
    let slope = one_octave - two_octaves;
    assert!(slope > 18.0 && slope < 30.0, "slope {slope} dB/oct");
}

#[test]
fn ladder_cutoff_sweep_is_monotonic() {
    let mut previous = f32::MIN;
    for cutoff in [200.0, 400.0, 800.0, 1600.0, 3200.0] {
        let mut vcf = LadderFilter::new(SAMPLE_RATE);
        vcf.set_cutoff(cutoff);
        let level = measure_response(&mut vcf, 1000.0);
        assert!(level > previous, "{cutoff} Hz -> {level} dB");
        previous = level;
    }
}

#[test]
fn one_pole_is_minus_3db_at_cutoff() {
    let mut lp = OnePole::new(SAMPLE_RATE, 1000.0);
    let at_cutoff = measure_response(&mut lp, 1000.0);
    assert!((at_cutoff + 3.0).abs() < 0.7, "{at_cutoff} dB");
}

#[test]
fn delay_line_reproduces_sine_shifted() {
    let signal = generate_sine(440.0, 2048);
    let mut line = DelayLine::from_time(SAMPLE_RATE, 0.01);
    let delay = 37.0;
    let mut out = Vec::with_capacity(signal.len());
    for &x in &signal {
        line.write(x);
        out.push(line.read(delay));
    }
    for n in 100..signal.len() {
        assert!((out[n] - signal[n - 37]).abs() < 1e-6);
    }
}

#[test]
fn lfo_triangle_is_symmetric_and_linear() {
    let mut lfo = Lfo::new(1000.0, 1.0);
    lfo.set_waveform(LfoWaveform::Triangle);
    let cycle: Vec<f32> = (0..1000).map(|_| lfo.next()).collect();

    assert!((cycle[0] + 1.0).abs() < 1e-5);
    assert!((cycle[500] - 1.0).abs() < 1e-3);
    for i in 1..500 {
        let step = cycle[i] - cycle[i - 1];
        assert!((step - 0.004).abs() < 1e-4, "non-linear step {step} at {i}");
    }
    for i in 0..500 {
        assert!((cycle[250 + i % 250] - cycle[750 - i % 250]).abs() < 1e-2);
    }
}
