//! Shared LFO and per-voice fade-in.
//!
//! There is exactly one LFO phase. [`MasterLfo`] renders it once per block
//! into a buffer that every voice reads, so modulation stays phase-locked
//! across the pool. Each voice owns a [`VoiceLfo`] that scales the shared
//! value by its own delay ramp, restarted on every fresh note.

use libm::roundf;
use sextet_core::{Lfo, LfoWaveform};

/// Steps per unit of triangle amplitude.
const QUANTIZE_STEPS: f32 = 15.0;

/// Free-running stepped triangle.
#[derive(Debug, Clone)]
pub struct MasterLfo {
    lfo: Lfo,
}

impl MasterLfo {
    /// Triangle LFO at `rate_hz`, starting at its negative peak.
    pub fn new(sample_rate: f32, rate_hz: f32) -> Self {
        let mut lfo = Lfo::new(sample_rate, rate_hz);
        lfo.set_waveform(LfoWaveform::Triangle);
        Self { lfo }
    }

    /// Update sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.lfo.set_sample_rate(sample_rate);
    }

    /// Set the rate in Hz.
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.lfo.set_frequency(rate_hz);
    }

    /// Current rate in Hz.
    pub fn rate(&self) -> f32 {
        self.lfo.frequency()
    }

    /// Restart at phase zero.
    pub fn reset(&mut self) {
        self.lfo.reset();
    }

    /// Next quantised value in `[-1, 1]`.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let tri = self.lfo.next();
        (roundf(tri * QUANTIZE_STEPS) / QUANTIZE_STEPS).clamp(-1.0, 1.0)
    }

    /// Render one block of values.
    pub fn fill(&mut self, buffer: &mut [f32]) {
        for value in buffer.iter_mut() {
            *value = self.next();
        }
    }
}

/// Per-voice LFO delay: fades the shared value in after each note-on.
///
/// ```rust
/// use sextet_synth::VoiceLfo;
///
/// let mut lfo = VoiceLfo::new(1000.0);
/// lfo.set_delay_seconds(0.1);
/// lfo.note_on();
/// assert_eq!(lfo.process(1.0), 0.0);
/// for _ in 0..200 {
///     lfo.process(1.0);
/// }
/// assert_eq!(lfo.process(1.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct VoiceLfo {
    sample_rate: f32,
    delay_samples: f32,
    elapsed: f32,
    value: f32,
}

impl VoiceLfo {
    /// Fade-in disabled.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate: sample_rate.max(1.0),
            delay_samples: 0.0,
            elapsed: 0.0,
            value: 0.0,
        }
    }

    /// Update sample rate, keeping the fade-in time.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let seconds = self.delay_samples / self.sample_rate;
        self.sample_rate = sample_rate.max(1.0);
        self.delay_samples = seconds * self.sample_rate;
    }

    /// Fade-in duration; zero means full depth immediately.
    pub fn set_delay_seconds(&mut self, seconds: f32) {
        self.delay_samples = seconds.max(0.0) * self.sample_rate;
    }

    /// Restart the fade-in.
    pub fn note_on(&mut self) {
        self.elapsed = 0.0;
    }

    /// Fade-in gain in `[0, 1]`.
    #[inline]
    pub fn fade(&self) -> f32 {
        if self.delay_samples <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.delay_samples).min(1.0)
        }
    }

    /// Scale the shared LFO value and advance the fade-in by one sample.
    #[inline]
    pub fn process(&mut self, global: f32) -> f32 {
        self.value = global * self.fade();
        if self.elapsed < self.delay_samples {
            self.elapsed += 1.0;
        }
        self.value
    }

    /// Value returned by the last [`process`](Self::process).
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn master_lfo_is_stepped() {
        let mut lfo = MasterLfo::new(1000.0, 1.0);
        let mut seen: Vec<i32> = Vec::new();
        for _ in 0..1000 {
            let v = lfo.next();
            assert!((-1.0..=1.0).contains(&v));
            let step = libm::roundf(v * 15.0) as i32;
            assert!((v * 15.0 - step as f32).abs() < 1e-4, "{v} is off-grid");
            if !seen.contains(&step) {
                seen.push(step);
            }
        }
        assert!(seen.len() >= 16 && seen.len() <= 32, "{} levels", seen.len());
    }

    #[test]
    fn master_lfo_is_symmetric() {
        let mut lfo = MasterLfo::new(1000.0, 1.0);
        let values: Vec<f32> = (0..1000).map(|_| lfo.next()).collect();
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        assert!(mean.abs() < 0.01, "stepped triangle mean {mean}");
        assert!(values.contains(&1.0));
        assert!(values.contains(&-1.0));
    }

    #[test]
    fn fill_matches_next() {
        let mut a = MasterLfo::new(48000.0, 5.0);
        let mut b = a.clone();
        let mut buf = [0.0; 64];
        a.fill(&mut buf);
        for v in buf {
            assert_eq!(v, b.next());
        }
    }

    #[test]
    fn fade_in_is_linear() {
        let mut lfo = VoiceLfo::new(1000.0);
        lfo.set_delay_seconds(1.0);
        lfo.note_on();
        for _ in 0..500 {
            lfo.process(1.0);
        }
        assert!((lfo.process(1.0) - 0.5).abs() < 0.01);
    }

    #[test]
    fn zero_delay_is_full_depth() {
        let mut lfo = VoiceLfo::new(48000.0);
        lfo.note_on();
        assert_eq!(lfo.process(-0.6), -0.6);
        assert_eq!(lfo.value(), -0.6);
    }

    #[test]
    fn note_on_restarts_fade() {
        let mut lfo = VoiceLfo::new(1000.0);
        lfo.set_delay_seconds(0.01);
        lfo.note_on();
        for _ in 0..20 {
            lfo.process(1.0);
        }
        assert_eq!(lfo.fade(), 1.0);
        lfo.note_on();
        assert_eq!(lfo.fade(), 0.0);
    }
}
