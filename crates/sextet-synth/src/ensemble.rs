//! Bucket-brigade chorus.
//!
//! Each [`BbdLine`] is a short modulated delay: linear-interpolated reads
//! (whose high-frequency droop stands in for the BBD's limited bandwidth), a
//! small clock-noise floor, and a 9 kHz reconstruction low-pass. The
//! [`Ensemble`] runs line I, line II or both from one mono input and spreads
//! the result to stereo with the wet signal in anti-phase between channels,
//! plus a little filtered hiss and channel crosstalk.
//!
//! | Mode | LFO | Depth | Base delay | Hiss |
//! |------|-----|-------|------------|------|
//! | I    | 0.4 Hz | 0.12 | 6 ms | 0.0004 |
//! | II   | 0.6 Hz | 0.25 | 8 ms | 0.0008 |
//! | I+II | both, wet × 0.707 | | | 0.0006 |

use crate::params::ChorusMode;
use sextet_core::{
    Biquad, BiquadCoefficients, DelayLine, Lfo, LfoWaveform, OnePole, Xorshift32, wet_dry_mix,
};

/// Ring buffer length in seconds.
const BBD_MAX_SECONDS: f32 = 0.1;
/// Clock bleed added to every read.
const BBD_NOISE_FLOOR: f32 = 0.0005;
/// Reconstruction filter corner.
const BBD_LPF_HZ: f32 = 9000.0;
const BBD_LPF_Q: f32 = 0.707;

const HISS_LPF_HZ: f32 = 8000.0;
const CROSSTALK: f32 = 0.03;
/// Wet sum scaling when both lines run.
const DUAL_LINE_GAIN: f32 = 0.707;

/// Dry/wet blend, equal parts.
const MIX: f32 = 0.5;

struct LineSettings {
    rate_hz: f32,
    depth: f32,
    base_ms: f32,
}

const LINE_I: LineSettings = LineSettings {
    rate_hz: 0.4,
    depth: 0.12,
    base_ms: 6.0,
};

const LINE_II: LineSettings = LineSettings {
    rate_hz: 0.6,
    depth: 0.25,
    base_ms: 8.0,
};

/// One bucket-brigade delay line.
#[derive(Debug, Clone)]
pub struct BbdLine {
    sample_rate: f32,
    line: DelayLine,
    reconstruction: Biquad,
    noise: Xorshift32,
    noise_floor: f32,
}

impl BbdLine {
    /// Line holding up to 100 ms.
    pub fn new(sample_rate: f32, seed: u32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        Self {
            sample_rate,
            line: DelayLine::from_time(sample_rate, BBD_MAX_SECONDS),
            reconstruction: Biquad::with_coefficients(BiquadCoefficients::lowpass(
                BBD_LPF_HZ,
                BBD_LPF_Q,
                sample_rate,
            )),
            noise: Xorshift32::new(seed),
            noise_floor: BBD_NOISE_FLOOR,
        }
    }

    /// Reallocates the ring buffer. Not for the audio thread.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.line = DelayLine::from_time(self.sample_rate, BBD_MAX_SECONDS);
        self.reconstruction
            .set_coefficients(BiquadCoefficients::lowpass(BBD_LPF_HZ, BBD_LPF_Q, self.sample_rate));
        self.reconstruction.clear();
    }

    /// Set the clock-noise level.
    pub fn set_noise_floor(&mut self, level: f32) {
        self.noise_floor = level.max(0.0);
    }

    /// Push `input` and read back `delay_ms` later.
    #[inline]
    pub fn process(&mut self, input: f32, delay_ms: f32) -> f32 {
        self.line.write(input);
        let delayed = self.line.read(delay_ms * 0.001 * self.sample_rate);
        let noisy = delayed + self.noise.next_bipolar() * self.noise_floor;
        self.reconstruction.process(noisy)
    }

    /// Clear the buffer and filter.
    pub fn reset(&mut self) {
        self.line.clear();
        self.reconstruction.clear();
    }
}

/// Stereo ensemble effect fed from the mono voice mix.
///
/// ```rust
/// use sextet_synth::{ChorusMode, Ensemble};
///
/// let mut chorus = Ensemble::new(48000.0);
/// chorus.set_mode(ChorusMode::Off);
/// assert_eq!(chorus.process(0.5), (0.5, 0.5));
///
/// chorus.set_mode(ChorusMode::I);
/// let (l, r) = chorus.process(0.5);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Ensemble {
    mode: ChorusMode,
    line_i: BbdLine,
    line_ii: BbdLine,
    lfo_i: Lfo,
    lfo_ii: Lfo,
    hiss_left: OnePole,
    hiss_right: OnePole,
    hiss_noise: Xorshift32,
}

impl Ensemble {
    /// Ensemble switched off.
    pub fn new(sample_rate: f32) -> Self {
        let mut lfo_i = Lfo::new(sample_rate, LINE_I.rate_hz);
        lfo_i.set_waveform(LfoWaveform::Triangle);
        let mut lfo_ii = Lfo::new(sample_rate, LINE_II.rate_hz);
        lfo_ii.set_waveform(LfoWaveform::Triangle);
        Self {
            mode: ChorusMode::Off,
            line_i: BbdLine::new(sample_rate, 0x0BB0_0001),
            line_ii: BbdLine::new(sample_rate, 0x0BB0_0002),
            lfo_i,
            lfo_ii,
            hiss_left: OnePole::new(sample_rate, HISS_LPF_HZ),
            hiss_right: OnePole::new(sample_rate, HISS_LPF_HZ),
            hiss_noise: Xorshift32::new(0x5EED_0BBD),
        }
    }

    /// Reallocates the delay lines. Not for the audio thread.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.line_i.set_sample_rate(sample_rate);
        self.line_ii.set_sample_rate(sample_rate);
        self.lfo_i.set_sample_rate(sample_rate);
        self.lfo_ii.set_sample_rate(sample_rate);
        self.hiss_left.set_sample_rate(sample_rate);
        self.hiss_right.set_sample_rate(sample_rate);
        self.reset();
    }

    /// Select the mode. Switching clears the lines so no stale audio leaks.
    pub fn set_mode(&mut self, mode: ChorusMode) {
        if mode != self.mode {
            self.mode = mode;
            self.reset();
        }
    }

    /// Current mode.
    pub fn mode(&self) -> ChorusMode {
        self.mode
    }

    fn hiss_level(&self) -> f32 {
        match self.mode {
            ChorusMode::Off => 0.0,
            ChorusMode::I => 0.0004,
            ChorusMode::II => 0.0008,
            ChorusMode::Both => 0.0006,
        }
    }

    /// Process one mono sample into a stereo pair.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        if self.mode == ChorusMode::Off {
            return (input, input);
        }

        let tri_i = self.lfo_i.next();
        let tri_ii = self.lfo_ii.next();
        let run_i = matches!(self.mode, ChorusMode::I | ChorusMode::Both);
        let run_ii = matches!(self.mode, ChorusMode::II | ChorusMode::Both);

        let wet_i = if run_i {
            let delay = LINE_I.base_ms + tri_i * LINE_I.depth * 2.0;
            self.line_i.process(input, delay)
        } else {
            0.0
        };
        let wet_ii = if run_ii {
            let delay = LINE_II.base_ms + tri_ii * LINE_II.depth * 2.0;
            self.line_ii.process(input, delay)
        } else {
            0.0
        };
        let wet = if run_i && run_ii {
            (wet_i + wet_ii) * DUAL_LINE_GAIN
        } else {
            wet_i + wet_ii
        };

        let hiss = self.hiss_level();
        let hiss_l = self.hiss_left.process(self.hiss_noise.next_bipolar()) * hiss;
        let hiss_r = self.hiss_right.process(self.hiss_noise.next_bipolar()) * hiss;

        let left = wet_dry_mix(input, wet + hiss_l, MIX);
        let right = wet_dry_mix(input, -wet + hiss_r, MIX);

        (left + right * CROSSTALK, right + left * CROSSTALK)
    }

    /// Process a mono block into separate left and right buffers.
    ///
    /// Processes `min` of the three lengths.
    pub fn process_block(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            (*l, *r) = self.process(x);
        }
    }

    /// Clear delay lines and filters; LFO phases restart.
    pub fn reset(&mut self) {
        self.line_i.reset();
        self.line_ii.reset();
        self.lfo_i.reset();
        self.lfo_ii.reset();
        self.hiss_left.reset();
        self.hiss_right.reset();
    }
}
