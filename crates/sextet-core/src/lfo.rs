//! Phase-accumulator low-frequency oscillator.
//!
//! Drives the master vibrato/filter LFO and the chorus delay sweep. Output is
//! bipolar in `[-1, 1]`.

use core::f32::consts::TAU;
use libm::sinf;

/// LFO waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Smooth sine.
    Sine,
    /// Linear up/down ramp. Starts at -1.
    #[default]
    Triangle,
}

/// Low-frequency oscillator.
///
/// ```rust
/// use sextet_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(48000.0, 0.5);
/// lfo.set_waveform(LfoWaveform::Triangle);
/// let v = lfo.next();
/// assert!((-1.0..=1.0).contains(&v));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Oscillator at `freq_hz`, phase zero, triangle wave.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
            waveform: LfoWaveform::Triangle,
        }
    }

    /// Change the rate without disturbing phase.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = (freq_hz / self.sample_rate).clamp(0.0, 0.5);
    }

    /// Current rate in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Change the sample rate, keeping the rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate.max(1.0);
        self.set_frequency(freq);
    }

    /// Select the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Jump to a phase in turns, wrapped into `[0, 1)`.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - libm::floorf(phase);
    }

    /// Current phase in turns.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Return to phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Output for the current phase, then advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let out = match self.waveform {
            LfoWaveform::Sine => sinf(self.phase * TAU),
            LfoWaveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_is_one_cycle_at_one_hz() {
        let mut lfo = Lfo::new(48000.0, 1.0);
        for _ in 0..48000 {
            lfo.next();
        }
        let err = lfo.phase().min(1.0 - lfo.phase());
        assert!(err < 1e-3, "phase drift {err}");
    }

    #[test]
    fn triangle_spans_full_range() {
        let mut lfo = Lfo::new(1000.0, 10.0);
        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for _ in 0..100 {
            let v = lfo.next();
            lo = lo.min(v);
            hi = hi.max(v);
        }
        assert!(lo <= -0.99 && hi >= 0.99, "range {lo}..{hi}");
    }

    #[test]
    fn sine_half_cycle_offset_is_inverted() {
        let mut a = Lfo::new(48000.0, 2.0);
        let mut b = Lfo::new(48000.0, 2.0);
        a.set_waveform(LfoWaveform::Sine);
        b.set_waveform(LfoWaveform::Sine);
        a.set_phase(0.1);
        b.set_phase(0.6);
        assert!((a.next() + b.next()).abs() < 1e-4);
    }

    #[test]
    fn set_phase_wraps() {
        let mut lfo = Lfo::default();
        lfo.set_phase(1.25);
        assert!((lfo.phase() - 0.25).abs() < 1e-6);
    }
}
