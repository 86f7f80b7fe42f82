//! The complete six-voice engine.
//!
//! [`SynthEngine`] owns the voice pool, the shared LFO, the sustain state and
//! the ensemble, and runs the per-block pipeline:
//!
//! ```text
//! params ──► clamp ──► mod wheel ──► poly mode ──► flush sustain ──► voices
//!                                                                      │
//! master LFO buffer ─────────────────────────────────────────────────► │
//!                                                                      ▼
//!        channels ◄── DC block ◄── ensemble ◄── sag × master ◄── mono mix
//! ```
//!
//! Every buffer is sized in [`SynthEngine::new`] / [`SynthEngine::prepare`];
//! rendering never allocates. Blocks longer than the prepared maximum are
//! processed in chunks.

use crate::ensemble::Ensemble;
use crate::handoff::{ParamPublisher, ParamReceiver, param_channel};
use crate::lfo::MasterLfo;
use crate::params::SynthParams;
use crate::performance::{DEFAULT_QUEUE_CAPACITY, PerformanceState, SustainPedal};
use crate::voice_manager::VoiceManager;
use alloc::vec;
use alloc::vec::Vec;
use sextet_core::{DcBlocker, SmoothedParam, sanitize};

/// Output DC blocker corner.
const DC_BLOCK_HZ: f32 = 20.0;
/// Supply droop per unit of summed envelope level.
const SAG_PER_ENVELOPE: f32 = 0.025;
/// Lowest supply scaling under full load.
const MIN_SAG: f32 = 0.8;
/// Master level smoothing.
const MASTER_SMOOTHING_MS: f32 = 20.0;

/// Polyphonic synthesizer engine.
///
/// # Example
///
/// ```rust
/// use sextet_synth::SynthEngine;
///
/// let mut engine = SynthEngine::new(48000.0, 256);
/// engine.note_on(60, 1.0);
///
/// let mut left = vec![0.0f32; 256];
/// let mut right = vec![0.0f32; 256];
/// engine.render_stereo(&mut left, &mut right);
///
/// assert_eq!(engine.active_voice_count(), 1);
/// assert!(left.iter().all(|s| s.is_finite()));
/// ```
#[derive(Debug)]
pub struct SynthEngine {
    sample_rate: f32,
    max_block_size: usize,
    params: SynthParams,
    receiver: ParamReceiver,
    publisher: Option<ParamPublisher>,
    voices: VoiceManager,
    performance: PerformanceState,
    master_lfo: MasterLfo,
    ensemble: Ensemble,
    dc_left: DcBlocker,
    dc_right: DcBlocker,
    master_gain: SmoothedParam,
    lfo_buffer: Vec<f32>,
    mix_buffer: Vec<f32>,
    left_buffer: Vec<f32>,
    right_buffer: Vec<f32>,
}

impl SynthEngine {
    /// Engine with default parameters, prepared for `sample_rate` and blocks
    /// of up to `max_block_size` samples.
    pub fn new(sample_rate: f32, max_block_size: usize) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let max_block_size = max_block_size.max(1);
        let params = SynthParams::default();
        let (publisher, receiver) = param_channel(params);
        Self {
            sample_rate,
            max_block_size,
            params,
            receiver,
            publisher: Some(publisher),
            voices: VoiceManager::new(sample_rate),
            performance: PerformanceState::new(DEFAULT_QUEUE_CAPACITY),
            master_lfo: MasterLfo::new(sample_rate, params.lfo_rate_hz()),
            ensemble: Ensemble::new(sample_rate),
            dc_left: DcBlocker::with_cutoff(sample_rate, DC_BLOCK_HZ),
            dc_right: DcBlocker::with_cutoff(sample_rate, DC_BLOCK_HZ),
            master_gain: SmoothedParam::with_config(
                params.master_level,
                sample_rate,
                MASTER_SMOOTHING_MS,
            ),
            lfo_buffer: vec![0.0; max_block_size],
            mix_buffer: vec![0.0; max_block_size],
            left_buffer: vec![0.0; max_block_size],
            right_buffer: vec![0.0; max_block_size],
        }
    }

    /// Replace the sustain queue with one holding `capacity` note-offs.
    ///
    /// Existing [`SustainPedal`] handles are detached from the new queue.
    #[must_use]
    pub fn with_sustain_capacity(mut self, capacity: usize) -> Self {
        let inverted = self.performance.sustain_pedal().is_inverted();
        self.performance = PerformanceState::new(capacity);
        self.performance.set_inverted(inverted);
        self
    }

    /// Re-target the engine. Allocates; call off the audio thread.
    ///
    /// Every voice is silenced and all effect state is cleared.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate.max(1.0);
        self.max_block_size = max_block_size.max(1);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = self.sample_rate,
            max_block_size = self.max_block_size,
            "engine prepared"
        );

        self.voices.prepare(self.sample_rate);
        self.master_lfo.set_sample_rate(self.sample_rate);
        self.master_lfo.reset();
        self.ensemble.set_sample_rate(self.sample_rate);
        self.dc_left.set_sample_rate(self.sample_rate);
        self.dc_right.set_sample_rate(self.sample_rate);
        self.dc_left.reset();
        self.dc_right.reset();
        self.master_gain.set_sample_rate(self.sample_rate);
        self.master_gain.set_immediate(self.params.master_level);
        self.performance.clear();

        for buffer in [
            &mut self.lfo_buffer,
            &mut self.mix_buffer,
            &mut self.left_buffer,
            &mut self.right_buffer,
        ] {
            buffer.clear();
            buffer.resize(self.max_block_size, 0.0);
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest chunk rendered in one pass.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Set parameters directly from the render thread.
    ///
    /// The poly mode switches immediately; everything else takes effect at
    /// the next block. A later publish through the [`ParamPublisher`]
    /// overrides it.
    pub fn set_params(&mut self, params: SynthParams) {
        self.params = params.clamped();
        self.voices.set_poly_mode(self.params.poly_mode);
    }

    /// Parameters in force for the next block (before mod-wheel folding).
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Take the cross-thread parameter publisher. Returns `None` once taken.
    pub fn param_publisher(&mut self) -> Option<ParamPublisher> {
        self.publisher.take()
    }

    /// Start a note. `velocity` is in `[0, 1]`; zero is treated as note-off.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };
        if velocity <= 0.0 {
            self.note_off(note, 0.0);
            return;
        }
        self.performance.handle_note_on(note);
        self.voices.note_on(note, velocity);
    }

    /// Release a note, deferred while the sustain pedal is down.
    ///
    /// Release velocity is accepted for interface symmetry and ignored.
    pub fn note_off(&mut self, note: u8, _velocity: f32) {
        self.performance.handle_note_off(note, &mut self.voices);
    }

    /// Apply a sustain pedal CC value (0..=127, down at 64).
    pub fn sustain(&mut self, value: u8) {
        self.performance.handle_sustain(value);
    }

    /// Thread-safe handle to the sustain pedal.
    pub fn sustain_pedal(&self) -> SustainPedal {
        self.performance.sustain_pedal()
    }

    /// Flip sustain pedal polarity.
    pub fn set_sustain_inverted(&mut self, inverted: bool) {
        self.performance.set_inverted(inverted);
    }

    /// Release every voice; parked note-offs are dropped.
    pub fn all_notes_off(&mut self) {
        self.performance.clear();
        self.voices.all_notes_off();
    }

    /// Hard stop: silence every voice and clear effect tails.
    pub fn panic(&mut self) {
        self.performance.clear();
        self.voices.reset_all_voices();
        self.ensemble.reset();
        self.dc_left.reset();
        self.dc_right.reset();
    }

    /// Render `num_samples` starting at `start`, adding into every channel.
    ///
    /// The first channel receives the left output, the second the right;
    /// further channels are left untouched. Mono callers get the left
    /// channel. The range is clipped to the shortest channel. With no
    /// voice sounding the channels are not touched at all.
    pub fn render_next_block(
        &mut self,
        channels: &mut [&mut [f32]],
        start: usize,
        num_samples: usize,
    ) {
        let Some(shortest) = channels.iter().map(|c| c.len()).min() else {
            return;
        };
        let end = start.saturating_add(num_samples).min(shortest);
        let mut position = start;
        while position < end {
            let len = (end - position).min(self.max_block_size);
            self.render_chunk(channels, position, len);
            position += len;
        }
    }

    /// Render into a stereo pair, adding to existing content.
    pub fn render_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        let len = left.len().min(right.len());
        self.render_next_block(&mut [left, right], 0, len);
    }

    /// Render into one channel, adding to existing content.
    pub fn render_mono(&mut self, out: &mut [f32]) {
        let len = out.len();
        self.render_next_block(&mut [out], 0, len);
    }

    /// Voices not idle.
    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    /// Summed envelope level, for metering.
    pub fn total_envelope_level(&self) -> f32 {
        self.voices.total_envelope_level()
    }

    /// Slot of the most recent note-on, for display.
    pub fn last_triggered_voice_index(&self) -> usize {
        self.voices.last_triggered_voice_index()
    }

    /// Read-only view of the voice pool.
    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    /// Pull control state into the voices. Runs once per chunk.
    fn begin_block(&mut self) {
        if let Some(published) = self.receiver.poll() {
            self.params = published.clamped();
        }
        let params = self.params.modulated();

        self.voices.set_poly_mode(params.poly_mode);
        self.performance.flush_sustain(&mut self.voices);
        self.voices.update_params(&params);

        self.master_lfo.set_rate(params.lfo_rate_hz());
        self.ensemble.set_mode(params.chorus);
        self.master_gain.set_target(params.master_level);
    }

    fn render_chunk(&mut self, channels: &mut [&mut [f32]], start: usize, len: usize) {
        self.begin_block();

        let lfo = &mut self.lfo_buffer[..len];
        self.master_lfo.fill(lfo);

        if self.voices.active_voice_count() == 0 {
            let target = self.master_gain.target();
            self.master_gain.set_immediate(target);
            return;
        }

        let mix = &mut self.mix_buffer[..len];
        mix.fill(0.0);
        self.voices.render_next_block(mix, &self.lfo_buffer[..len]);

        let sag = (1.0 - self.voices.total_envelope_level() * SAG_PER_ENVELOPE).max(MIN_SAG);
        for sample in mix.iter_mut() {
            *sample *= sag * self.master_gain.advance();
        }

        let left = &mut self.left_buffer[..len];
        let right = &mut self.right_buffer[..len];
        self.ensemble.process_block(mix, left, right);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = sanitize(self.dc_left.process(*l));
            *r = sanitize(self.dc_right.process(*r));
        }

        let mut outputs = channels.iter_mut();
        if let Some(channel) = outputs.next() {
            for (out, &s) in channel[start..start + len].iter_mut().zip(left.iter()) {
                *out += s;
            }
        }
        if let Some(channel) = outputs.next() {
            for (out, &s) in channel[start..start + len].iter_mut().zip(right.iter()) {
                *out += s;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ChorusMode, PolyMode};
    use crate::voice::VoiceActivity;

    const SR: f32 = 48000.0;

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn silent_engine_leaves_buffer_untouched() {
        let mut engine = SynthEngine::new(SR, 64);
        let mut left = [0.25f32; 64];
        let mut right = [-0.25f32; 64];
        engine.render_stereo(&mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.25));
        assert!(right.iter().all(|&s| s == -0.25));
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[test]
    fn note_produces_sound_then_decays() {
        let mut engine = SynthEngine::new(SR, 512);
        engine.note_on(60, 1.0);
        let mut out = vec![0.0f32; 1000];
        engine.render_mono(&mut out);
        assert!(peak(&out) > 0.0);
        assert!(out.iter().all(|s| s.is_finite()));

        engine.note_off(60, 0.0);
        let mut tail = vec![0.0f32; 48000];
        engine.render_mono(&mut tail);
        assert!(peak(&tail[tail.len() - 512..]) < 1e-4);
    }

    #[test]
    fn oversized_blocks_are_chunked() {
        let mut engine = SynthEngine::new(SR, 32);
        engine.note_on(64, 0.8);
        let mut left = vec![0.0f32; 1000];
        let mut right = vec![0.0f32; 1000];
        engine.render_stereo(&mut left, &mut right);
        assert!(peak(&left[900..]) > 0.0);
    }

    #[test]
    fn render_respects_start_offset() {
        let mut engine = SynthEngine::new(SR, 128);
        engine.note_on(60, 1.0);
        let mut buf = vec![0.0f32; 256];
        engine.render_next_block(&mut [&mut buf[..]], 128, 128);
        assert!(buf[..128].iter().all(|&s| s == 0.0));
        assert!(peak(&buf[128..]) > 0.0);
    }

    #[test]
    fn published_params_apply_next_block() {
        let mut engine = SynthEngine::new(SR, 64);
        let mut publisher = engine.param_publisher().expect("publisher available");
        assert!(engine.param_publisher().is_none());

        publisher.publish(&SynthParams {
            poly_mode: PolyMode::Unison,
            chorus: ChorusMode::II,
            ..SynthParams::default()
        });
        let mut buf = [0.0f32; 64];
        engine.render_mono(&mut buf);
        assert_eq!(engine.params().poly_mode, PolyMode::Unison);

        engine.note_on(60, 1.0);
        assert_eq!(engine.active_voice_count(), 6);
    }

    #[test]
    fn sustain_defers_release() {
        let mut engine = SynthEngine::new(SR, 64);
        engine.note_on(60, 1.0);
        engine.sustain(127);
        engine.note_off(60, 0.0);
        let mut buf = [0.0f32; 64];
        engine.render_mono(&mut buf);
        assert_eq!(engine.voices().activities()[0], VoiceActivity::Active);

        engine.sustain(0);
        engine.render_mono(&mut buf);
        assert_eq!(engine.voices().activities()[0], VoiceActivity::Releasing);
    }

    #[test]
    fn restruck_note_is_held_after_pedal_release() {
        let mut engine = SynthEngine::new(SR, 64);
        engine.note_on(60, 1.0);
        engine.sustain(127);
        engine.note_off(60, 0.0);
        engine.note_on(60, 1.0);
        engine.sustain(0);
        let mut buf = [0.0f32; 64];
        engine.render_mono(&mut buf);
        assert_eq!(engine.voices().activities()[0], VoiceActivity::Active);
        assert!(engine.voices().voices()[0].is_gate_on());
    }

    #[test]
    fn zero_velocity_is_note_off() {
        let mut engine = SynthEngine::new(SR, 64);
        engine.note_on(60, 1.0);
        engine.note_on(60, 0.0);
        assert!(!engine.voices().is_any_note_held());
    }

    #[test]
    fn panic_silences_immediately() {
        let mut engine = SynthEngine::new(SR, 64);
        for note in [60, 64, 67] {
            engine.note_on(note, 1.0);
        }
        engine.panic();
        assert_eq!(engine.active_voice_count(), 0);
        let mut buf = [0.0f32; 64];
        engine.render_mono(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn full_chord_with_chorus_stays_bounded() {
        let mut engine = SynthEngine::new(SR, 256);
        engine.set_params(SynthParams {
            chorus: ChorusMode::Both,
            resonance: 1.0,
            master_level: 1.0,
            ..SynthParams::default()
        });
        for note in [48, 55, 60, 64, 67, 72] {
            engine.note_on(note, 1.0);
        }
        let mut left = vec![0.0f32; 9600];
        let mut right = vec![0.0f32; 9600];
        engine.render_stereo(&mut left, &mut right);
        assert!(left.iter().chain(&right).all(|s| s.is_finite() && s.abs() < 8.0));
    }

    #[test]
    fn prepare_resizes_and_silences() {
        let mut engine = SynthEngine::new(SR, 64);
        engine.note_on(60, 1.0);
        engine.prepare(44100.0, 1024);
        assert_eq!(engine.max_block_size(), 1024);
        assert_eq!(engine.sample_rate(), 44100.0);
        assert_eq!(engine.active_voice_count(), 0);
    }
}
