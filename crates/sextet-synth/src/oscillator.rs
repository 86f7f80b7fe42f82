//! Digitally controlled oscillator.
//!
//! One phase accumulator drives four sources that are summed at a fixed
//! headroom:
//!
//! - falling sawtooth `1 − 2φ`
//! - pulse, width manual or LFO-swept, slewed toward its target
//! - sub-octave square from a flip-flop toggled on every phase wrap, so it is
//!   phase-locked to the main waveform
//! - white noise coloured by a 4 kHz peaking biquad
//!
//! Every hard edge gets a 2-point polyBLEP correction scaled by the phase
//! increment. The frequency is quantised to the period resolution of an
//! 8 MHz clock divided by 256, the way the hardware's counter timer sets
//! pitch, and a slow random walk adds analog-style drift.

use crate::params::{DcoRange, PwmMode, SynthParams};
use libm::floorf;
use sextet_core::{
    Biquad, BiquadCoefficients, SmoothedParam, Xorshift32, fast_exp2, flush_denormal,
};

/// Master clock of the counter timer, in Hz.
const TIMER_CLOCK_HZ: f32 = 8_000_000.0;
/// Fixed pre-divider ahead of the counter.
const TIMER_DIVIDER: f32 = 256.0;

/// Sum scaling so four full-scale sources stay in range.
pub const HEADROOM: f32 = 0.5;

/// Samples between drift target re-rolls.
const DRIFT_INTERVAL: u32 = 4096;
/// Per-sample approach toward the drift target.
const DRIFT_RATE: f32 = 0.001;
/// Drift walk to semitones at full drift amount.
const DRIFT_SEMITONES: f32 = 0.02;

/// Vibrato depth in semitones at full LFO-to-DCO.
const VIBRATO_SEMITONES: f32 = 0.5;

/// Manual pulse width range: `0.07 + pwm · 0.86`.
const MANUAL_WIDTH_MIN: f32 = 0.07;
const MANUAL_WIDTH_SPAN: f32 = 0.86;
/// LFO pulse width swing around 50%.
const LFO_WIDTH_SWING: f32 = 0.45;

/// Width slew coefficients per sample.
const MANUAL_WIDTH_SLEW: f32 = 0.0009;
const LFO_WIDTH_SLEW: f32 = 0.00047;

/// Noise colouring filter.
const NOISE_PEAK_HZ: f32 = 4000.0;
const NOISE_PEAK_Q: f32 = 0.707;
/// 0.707 linear.
const NOISE_PEAK_GAIN_DB: f32 = -3.0;

/// Quantise `freq_hz` to the nearest period the counter timer can produce.
///
/// ```rust
/// use sextet_synth::oscillator::quantize_to_timer;
///
/// let a4 = quantize_to_timer(440.0);
/// assert!((a4 - 440.0).abs() < 1.0);
/// ```
#[inline]
pub fn quantize_to_timer(freq_hz: f32) -> f32 {
    if freq_hz <= 0.0 || !freq_hz.is_finite() {
        return 0.0;
    }
    let ticks = floorf(TIMER_CLOCK_HZ / (freq_hz * TIMER_DIVIDER) + 0.5).clamp(1.0, 65535.0);
    TIMER_CLOCK_HZ / (ticks * TIMER_DIVIDER)
}

/// Two-sample polynomial band-limited step residual.
///
/// `t` is the phase distance past the edge in `[0, 1)`, `dt` the phase
/// increment. Add it at an upward ±1 edge, subtract it at a downward one.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

#[inline]
fn wrap_phase(phase: f32) -> f32 {
    if phase < 0.0 { phase + 1.0 } else { phase }
}

/// Composite band-limited oscillator.
///
/// ```rust
/// use sextet_synth::Dco;
///
/// let mut dco = Dco::new(48000.0, 1);
/// dco.set_frequency(220.0);
/// let block: Vec<f32> = (0..256).map(|_| dco.next_sample(0.0)).collect();
/// assert!(block.iter().all(|s| s.is_finite() && s.abs() <= 1.5));
/// ```
#[derive(Debug, Clone)]
pub struct Dco {
    sample_rate: f32,
    base_freq: f32,
    freq: f32,
    phase: f32,
    sub_flip_flop: bool,

    range: DcoRange,
    saw_level: f32,
    pulse_level: f32,
    sub_level: f32,
    noise_level: f32,
    pwm: f32,
    pwm_mode: PwmMode,
    lfo_depth: f32,
    drift_amount: f32,

    width: SmoothedParam,

    drift_walk: f32,
    drift_target: f32,
    drift_counter: u32,

    rng: Xorshift32,
    noise_color: Biquad,
}

impl Dco {
    /// Oscillator at 440 Hz with saw and pulse enabled. `seed` picks the
    /// noise and drift stream; give each voice its own.
    pub fn new(sample_rate: f32, seed: u32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let mut dco = Self {
            sample_rate,
            base_freq: 440.0,
            freq: quantize_to_timer(440.0),
            phase: 0.0,
            sub_flip_flop: false,
            range: DcoRange::Feet8,
            saw_level: 1.0,
            pulse_level: 1.0,
            sub_level: 0.0,
            noise_level: 0.0,
            pwm: 0.5,
            pwm_mode: PwmMode::Lfo,
            lfo_depth: 0.0,
            drift_amount: 0.0,
            width: SmoothedParam::with_coefficient(0.5, LFO_WIDTH_SLEW),
            drift_walk: 0.0,
            drift_target: 0.0,
            drift_counter: 0,
            rng: Xorshift32::new(seed),
            noise_color: Biquad::new(),
        };
        dco.update_noise_filter();
        dco
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_noise_filter();
    }

    /// Take the oscillator-section fields of a parameter snapshot.
    pub fn apply_params(&mut self, params: &SynthParams) {
        self.range = params.dco_range;
        self.saw_level = if params.saw_on { 1.0 } else { 0.0 };
        self.pulse_level = if params.pulse_on { 1.0 } else { 0.0 };
        self.sub_level = params.sub_level;
        self.noise_level = params.noise_level;
        self.pwm = params.pwm;
        self.lfo_depth = params.lfo_to_dco;
        self.drift_amount = params.drift;
        if params.pwm_mode != self.pwm_mode {
            self.pwm_mode = params.pwm_mode;
            self.width.set_coefficient(match self.pwm_mode {
                PwmMode::Manual => MANUAL_WIDTH_SLEW,
                PwmMode::Lfo => LFO_WIDTH_SLEW,
            });
        }
    }

    /// Set the pitch before footage, vibrato and drift.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.base_freq = freq_hz;
    }

    /// Frequency actually produced on the last sample, after quantisation.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current (slewed) pulse width.
    pub fn pulse_width(&self) -> f32 {
        self.width.get()
    }

    /// Note-start reset: phase to zero, drift cleared, width snapped to its
    /// target, sub flip-flop randomised.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.drift_walk = 0.0;
        self.drift_target = 0.0;
        self.drift_counter = 0;
        let target = self.width_target(0.0);
        self.width.set_immediate(target);
        self.sub_flip_flop = self.rng.next_bool();
    }

    fn width_target(&self, lfo: f32) -> f32 {
        match self.pwm_mode {
            PwmMode::Manual => MANUAL_WIDTH_MIN + self.pwm * MANUAL_WIDTH_SPAN,
            PwmMode::Lfo => (0.5 + lfo * self.pwm * LFO_WIDTH_SWING).clamp(0.05, 0.95),
        }
    }

    fn update_noise_filter(&mut self) {
        self.noise_color.set_coefficients(BiquadCoefficients::peaking(
            NOISE_PEAK_HZ,
            NOISE_PEAK_Q,
            NOISE_PEAK_GAIN_DB,
            self.sample_rate,
        ));
    }

    fn advance_drift(&mut self) -> f32 {
        self.drift_counter += 1;
        if self.drift_counter > DRIFT_INTERVAL {
            self.drift_counter = 0;
            self.drift_target = self.rng.next_bipolar();
        }
        self.drift_walk += (self.drift_target - self.drift_walk) * DRIFT_RATE;
        self.drift_walk * self.drift_amount * DRIFT_SEMITONES
    }

    /// Render one sample. `lfo` is the voice's LFO value in `[-1, 1]`.
    #[inline]
    pub fn next_sample(&mut self, lfo: f32) -> f32 {
        let vibrato = (lfo * 0.5 + 0.5) * self.lfo_depth * VIBRATO_SEMITONES;
        let drift = self.advance_drift();
        let raw = self.base_freq * self.range.multiplier() * fast_exp2((vibrato + drift) / 12.0);
        self.freq = quantize_to_timer(raw);

        let dt = (self.freq / self.sample_rate).min(0.5);
        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= floorf(self.phase);
            self.sub_flip_flop = !self.sub_flip_flop;
        }
        let phase = self.phase;

        self.width.set_target(self.width_target(lfo));
        let width = self.width.advance();

        let mut out = 0.0;

        if self.saw_level > 0.0 {
            let saw = 1.0 - 2.0 * phase + poly_blep(phase, dt);
            out += saw * self.saw_level;
        }

        if self.pulse_level > 0.0 {
            let mut pulse = if phase < width { 1.0 } else { -1.0 };
            pulse += poly_blep(phase, dt);
            pulse -= poly_blep(wrap_phase(phase - width), dt);
            out += pulse * self.pulse_level;
        }

        if self.sub_level > 0.0 {
            let high_half = phase < 0.5;
            let mut sub = if high_half == self.sub_flip_flop { 1.0 } else { -1.0 };
            let edge = poly_blep(wrap_phase(phase - 0.5), dt);
            if self.sub_flip_flop {
                sub -= edge;
            } else {
                sub += edge;
            }
            out += sub * self.sub_level;
        }

        if self.noise_level > 0.0 {
            let white = self.rng.next_bipolar();
            out += flush_denormal(self.noise_color.process(white)) * self.noise_level;
        }

        out * HEADROOM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::midi_to_freq;

    const SR: f32 = 48000.0;

    fn params() -> SynthParams {
        SynthParams::default()
    }

    fn cents_between(a: f32, b: f32) -> f32 {
        1200.0 * libm::log2f(a / b)
    }

    #[test]
    fn timer_quantisation_lands_on_whole_ticks() {
        // Middle C: 8 MHz / (261.63 * 256) ≈ 119.4, rounded to 119 ticks.
        let c4 = quantize_to_timer(midi_to_freq(60));
        assert!((c4 - TIMER_CLOCK_HZ / (119.0 * TIMER_DIVIDER)).abs() < 1e-3, "C4 at {c4}");
        assert!(cents_between(c4, midi_to_freq(60)) < 7.0);
        // 4 kHz: ticks ≈ 7.8, rounded to 8, gives 3906.25 Hz.
        assert!((quantize_to_timer(4000.0) - 3906.25).abs() < 1e-2);
        assert_eq!(quantize_to_timer(0.0), 0.0);
        assert!(quantize_to_timer(1e9) > 0.0);
    }

    #[test]
    fn timer_quantisation_is_coarse_at_the_top() {
        // C8: 8 MHz / (4186.01 * 256) ≈ 7.47, rounded to 7 ticks.
        let c8 = quantize_to_timer(midi_to_freq(108));
        assert!((c8 - TIMER_CLOCK_HZ / (7.0 * TIMER_DIVIDER)).abs() < 1e-2, "C8 at {c8}");
        let cents = cents_between(c8, midi_to_freq(108));
        assert!((cents - 111.4).abs() < 0.5, "C8 is {cents} cents sharp");
    }

    #[test]
    fn poly_blep_vanishes_away_from_edges() {
        assert_eq!(poly_blep(0.5, 0.01), 0.0);
        assert!((poly_blep(0.0, 0.01) + 1.0).abs() < 1e-6);
        assert!(poly_blep(0.999, 0.01) > 0.0);
    }

    #[test]
    fn output_is_bounded_with_everything_on() {
        let mut dco = Dco::new(SR, 7);
        dco.apply_params(&SynthParams {
            sub_level: 1.0,
            noise_level: 1.0,
            drift: 1.0,
            lfo_to_dco: 1.0,
            ..params()
        });
        dco.set_frequency(110.0);
        dco.reset();
        for n in 0..48000 {
            let lfo = libm::sinf(n as f32 * 0.001);
            let s = dco.next_sample(lfo);
            assert!(s.is_finite() && s.abs() < 2.5, "sample {n}: {s}");
        }
    }

    #[test]
    fn sub_toggles_once_per_cycle() {
        let mut dco = Dco::new(SR, 3);
        dco.apply_params(&SynthParams {
            saw_on: false,
            pulse_on: false,
            sub_level: 1.0,
            ..params()
        });
        dco.set_frequency(quantize_to_timer(480.0));
        dco.reset();
        let mut flips = 0;
        let mut last = dco.next_sample(0.0).signum();
        for _ in 0..4800 {
            let s = dco.next_sample(0.0).signum();
            if s != last {
                flips += 1;
            }
            last = s;
        }
        // 480 Hz main → 240 Hz sub → two edges per sub cycle over 0.1 s.
        assert!((40..=56).contains(&flips), "{flips} sub edges");
    }

    #[test]
    fn manual_width_tracks_pwm() {
        let mut dco = Dco::new(SR, 1);
        dco.apply_params(&SynthParams {
            pwm: 1.0,
            pwm_mode: PwmMode::Manual,
            ..params()
        });
        dco.reset();
        assert!((dco.pulse_width() - 0.93).abs() < 1e-6);
    }

    #[test]
    fn lfo_width_slews_toward_target() {
        let mut dco = Dco::new(SR, 1);
        dco.apply_params(&SynthParams { pwm: 1.0, ..params() });
        dco.reset();
        dco.next_sample(1.0);
        let w = dco.pulse_width();
        assert!(w > 0.5 && w < 0.51, "width jumped to {w}");
        for _ in 0..48000 {
            dco.next_sample(1.0);
        }
        assert!((dco.pulse_width() - 0.95).abs() < 1e-3);
    }

    #[test]
    fn saw_edge_is_smoothed() {
        let mut dco = Dco::new(SR, 1);
        dco.apply_params(&SynthParams { pulse_on: false, ..params() });
        dco.set_frequency(1000.0);
        dco.reset();
        let mut prev = dco.next_sample(0.0);
        let mut biggest_jump = 0.0f32;
        for _ in 0..480 {
            let s = dco.next_sample(0.0);
            biggest_jump = biggest_jump.max((s - prev).abs());
            prev = s;
        }
        // A naive saw jumps by the full 2.0 (1.0 after headroom).
        assert!(biggest_jump < 0.8, "edge step {biggest_jump}");
    }

    #[test]
    fn range_shifts_octaves() {
        let mut dco = Dco::new(SR, 1);
        dco.set_frequency(220.0);
        dco.apply_params(&SynthParams { dco_range: DcoRange::Feet4, ..params() });
        dco.next_sample(0.0);
        assert!((dco.frequency() - quantize_to_timer(440.0)).abs() < 1e-3);
        dco.apply_params(&SynthParams { dco_range: DcoRange::Feet16, ..params() });
        dco.next_sample(0.0);
        assert!((dco.frequency() - quantize_to_timer(110.0)).abs() < 1e-3);
    }

    #[test]
    fn silent_when_all_sources_off() {
        let mut dco = Dco::new(SR, 1);
        dco.apply_params(&SynthParams {
            saw_on: false,
            pulse_on: false,
            ..params()
        });
        for _ in 0..256 {
            assert_eq!(dco.next_sample(0.3), 0.0);
        }
    }
}
