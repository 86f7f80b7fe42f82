//! One synthesizer voice.
//!
//! Signal flow per sample:
//!
//! ```text
//! DCO ──► × envelope × velocity × VCA ──► HPF / bass shelf ──► ladder VCF ──► tanh ──► mix
//! ```
//!
//! The VCF cutoff is recomputed every [`FILTER_BATCH`] samples from the
//! envelope, LFO, bender and key position, summed in octaves and smoothed by
//! a one-pole so the batch steps are inaudible. Processing runs in those
//! batches end to end through a stack buffer, so a voice never allocates.

use crate::envelope::{AdsrEnvelope, EnvelopeState};
use crate::lfo::VoiceLfo;
use crate::oscillator::Dco;
use crate::params::{HpfMode, PolyMode, SynthParams, VcaMode};
use libm::{exp2f, powf};
use sextet_core::{
    Biquad, BiquadCoefficients, Effect, LadderFilter, LinearSmoothedParam, SmoothedParam,
    cents_to_ratio, sanitize, soft_clip,
};

/// Samples per VCF cutoff update.
pub const FILTER_BATCH: usize = 8;

/// Peak below which a released voice counts as silent.
pub const SILENCE_THRESHOLD: f32 = 1e-4;

/// Releases longer than this are forced idle.
const STUCK_RELEASE_SECONDS: f32 = 30.0;

/// Cutoff range: `10 · 2400^vcf` Hz, 10 Hz to 24 kHz.
const CUTOFF_BASE_HZ: f32 = 10.0;
const CUTOFF_SPAN: f32 = 2400.0;

/// Octaves of cutoff sweep at full depth.
const ENV_OCTAVES: f32 = 6.0;
const LFO_OCTAVES: f32 = 2.5;
const BENDER_OCTAVES: f32 = 3.5;

/// Per-batch smoothing of the octave modulation sum.
const MOD_SMOOTHING: f32 = 0.4;

/// Key tracking pivot.
const KEY_TRACK_CENTER: f32 = 60.0;

/// Ladder input drive.
const VCF_DRIVE: f32 = 1.3;
/// Resonance scale; slightly over 1 lets the ladder self-oscillate.
const MAX_RESONANCE: f32 = 1.05;

/// VCA, cutoff and resonance ramp time.
const CONTROL_RAMP_MS: f32 = 20.0;

/// Post-filter gain ahead of the output saturator.
const OUTPUT_GAIN: f32 = 0.75;

/// Gate mode segment time, in seconds.
const GATE_SEGMENT_SECONDS: f32 = 0.001;

const HPF_Q: f32 = 0.707;
const BASS_SHELF_HZ: f32 = 80.0;
/// 2× linear.
const BASS_SHELF_GAIN_DB: f32 = 6.0206;

/// Unison detune per pool slot, in cents.
const UNISON_DETUNE_CENTS: [f32; 6] = [-2.5, -1.5, -0.5, 0.5, 1.5, 2.5];

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * exp2f((note as f32 - 69.0) / 12.0)
}

/// Coarse voice lifecycle, as seen by the allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceActivity {
    /// Silent and free for allocation.
    #[default]
    Idle,
    /// Gate held.
    Active,
    /// Gate released, tail still sounding.
    Releasing,
}

/// A single voice of the pool.
///
/// ```rust
/// use sextet_synth::{SynthParams, Voice, VoiceActivity};
///
/// let mut voice = Voice::new(0, 48000.0);
/// voice.update_params(&SynthParams::default());
/// voice.note_on(60, 1.0, false);
///
/// let lfo = [0.0f32; 256];
/// let mut out = [0.0f32; 256];
/// voice.render_next_block(&mut out, &lfo);
/// assert_eq!(voice.activity(), VoiceActivity::Active);
///
/// voice.note_off();
/// assert_eq!(voice.activity(), VoiceActivity::Releasing);
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    index: usize,
    sample_rate: f32,
    params: SynthParams,

    note: Option<u8>,
    velocity: f32,
    gate: bool,

    dco: Dco,
    envelope: AdsrEnvelope,
    lfo: VoiceLfo,
    hpf: Biquad,
    hpf_mode: HpfMode,
    vcf: LadderFilter,

    /// Glided pitch in Hz.
    frequency: SmoothedParam,
    vca: LinearSmoothedParam,
    cutoff: LinearSmoothedParam,
    resonance: LinearSmoothedParam,
    /// Smoothed octave offset applied to the cutoff.
    mod_octaves: f32,

    last_output_level: f32,
    release_samples: u32,
}

impl Voice {
    /// Voice for pool slot `index`.
    pub fn new(index: usize, sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let params = SynthParams::default();
        let mut vcf = LadderFilter::new(sample_rate);
        vcf.set_drive(VCF_DRIVE);

        let mut voice = Self {
            index,
            sample_rate,
            params,
            note: None,
            velocity: 0.0,
            gate: false,
            dco: Dco::new(sample_rate, 0x9E37_79B9 ^ (index as u32 + 1).wrapping_mul(0x85EB_CA6B)),
            envelope: AdsrEnvelope::new(sample_rate),
            lfo: VoiceLfo::new(sample_rate),
            hpf: Biquad::new(),
            hpf_mode: params.hpf_mode,
            vcf,
            frequency: SmoothedParam::with_config(440.0, sample_rate, 0.0),
            vca: LinearSmoothedParam::with_config(1.0, sample_rate, CONTROL_RAMP_MS),
            cutoff: LinearSmoothedParam::with_config(params.vcf_cutoff, sample_rate, CONTROL_RAMP_MS),
            resonance: LinearSmoothedParam::with_config(0.0, sample_rate, CONTROL_RAMP_MS),
            mod_octaves: 0.0,
            last_output_level: 0.0,
            release_samples: 0,
        };
        voice.design_hpf();
        voice.update_params(&params);
        voice
    }

    /// Re-target every sample-rate dependent component.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.dco.set_sample_rate(self.sample_rate);
        self.envelope.set_sample_rate(self.sample_rate);
        self.lfo.set_sample_rate(self.sample_rate);
        self.vcf.set_sample_rate(self.sample_rate);
        self.frequency.set_sample_rate(self.sample_rate);
        self.vca.set_sample_rate(self.sample_rate);
        self.cutoff.set_sample_rate(self.sample_rate);
        self.resonance.set_sample_rate(self.sample_rate);
        self.design_hpf();
        self.kill();
    }

    /// Take a new parameter snapshot. Cheap enough to call every block.
    pub fn update_params(&mut self, params: &SynthParams) {
        self.params = *params;
        let gate_mode = params.vca_mode == VcaMode::Gate;

        self.dco.apply_params(params);

        self.envelope.set_gate_mode(gate_mode);
        if gate_mode {
            self.envelope.set_times(
                GATE_SEGMENT_SECONDS,
                GATE_SEGMENT_SECONDS,
                1.0,
                GATE_SEGMENT_SECONDS,
            );
        } else {
            self.envelope.set_times(
                params.attack_seconds(),
                params.decay_seconds(),
                params.sustain,
                params.release_seconds(),
            );
        }

        self.vca.set_target(if gate_mode { params.vca_level } else { 1.0 });
        self.cutoff.set_target(params.vcf_cutoff);
        self.resonance
            .set_target((params.resonance * MAX_RESONANCE).min(MAX_RESONANCE));

        self.lfo.set_delay_seconds(params.lfo_delay_seconds());
        self.frequency
            .set_smoothing_time_ms(params.portamento_seconds() * 1000.0);

        if params.hpf_mode != self.hpf_mode {
            self.hpf_mode = params.hpf_mode;
            self.design_hpf();
        }
    }

    fn design_hpf(&mut self) {
        let sr = self.sample_rate;
        self.hpf.set_coefficients(match self.hpf_mode {
            HpfMode::BassBoost => {
                BiquadCoefficients::low_shelf(BASS_SHELF_HZ, HPF_Q, BASS_SHELF_GAIN_DB, sr)
            }
            HpfMode::Flat => BiquadCoefficients::highpass(10.0, HPF_Q, sr),
            HpfMode::Low => BiquadCoefficients::highpass(225.0, HPF_Q, sr),
            HpfMode::High => BiquadCoefficients::highpass(450.0, HPF_Q, sr),
        });
    }

    /// Start a note.
    ///
    /// The LFO fade-in restarts on every note-on. A fresh (non-legato) note
    /// also restarts the envelope from zero and resets the oscillator phase.
    /// A legato note re-enters Attack from the current level and, in unison
    /// with portamento on, glides.
    pub fn note_on(&mut self, note: u8, velocity: f32, legato: bool) {
        let target = midi_to_freq(note.min(127));
        self.note = Some(note.min(127));
        self.velocity = velocity.clamp(0.0, 1.0);
        self.gate = true;
        self.release_samples = 0;
        self.last_output_level = 1.0;
        self.lfo.note_on();

        if legato {
            self.envelope.gate_on();
        } else {
            self.envelope.restart();
            self.dco.reset();
            self.mod_octaves = 0.0;
        }

        let p = &self.params;
        let glide = p.poly_mode == PolyMode::Unison
            && p.portamento_on
            && (legato || !p.portamento_legato);
        if glide {
            self.frequency.set_target(target);
        } else {
            self.frequency.set_immediate(target);
        }
    }

    /// Same note struck again while sounding: re-enter Attack in place.
    pub fn retrigger(&mut self, velocity: f32) {
        self.velocity = velocity.clamp(0.0, 1.0);
        self.gate = true;
        self.release_samples = 0;
        self.last_output_level = self.last_output_level.max(1.0);
        self.lfo.note_on();
        self.envelope.gate_on();
    }

    /// Close the gate; the release tail keeps rendering.
    pub fn note_off(&mut self) {
        self.gate = false;
        self.release_samples = 0;
        self.envelope.gate_off();
    }

    /// Stop immediately and clear all state.
    pub fn kill(&mut self) {
        self.note = None;
        self.gate = false;
        self.velocity = 0.0;
        self.last_output_level = 0.0;
        self.release_samples = 0;
        self.mod_octaves = 0.0;
        self.envelope.reset();
        self.hpf.clear();
        self.vcf.reset();
    }

    /// True while the envelope runs or the last block was audible.
    pub fn is_active(&self) -> bool {
        self.envelope.is_active() || self.last_output_level > SILENCE_THRESHOLD
    }

    /// Lifecycle state.
    pub fn activity(&self) -> VoiceActivity {
        if !self.is_active() {
            VoiceActivity::Idle
        } else if self.gate {
            VoiceActivity::Active
        } else {
            VoiceActivity::Releasing
        }
    }

    /// Note held or sounding, if any.
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    /// Velocity of the current note.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// True while the key is down.
    pub fn is_gate_on(&self) -> bool {
        self.gate
    }

    /// Pool slot.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Envelope stage.
    pub fn envelope_state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    /// Current envelope level.
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// Peak absolute output of the last rendered block.
    pub fn last_output_level(&self) -> f32 {
        self.last_output_level
    }

    /// Glided pitch in Hz, before tune, bend and footage.
    pub fn frequency(&self) -> f32 {
        self.frequency.get()
    }

    /// Cutoff the VCF used on the last batch, in Hz.
    pub fn filter_cutoff(&self) -> f32 {
        self.vcf.cutoff()
    }

    fn pitch_scale(&self) -> f32 {
        let p = &self.params;
        let mut cents = p.tune;
        if p.poly_mode == PolyMode::Unison {
            cents += UNISON_DETUNE_CENTS[self.index % UNISON_DETUNE_CENTS.len()];
        }
        cents_to_ratio(cents) * exp2f(p.bender * p.bender_to_dco)
    }

    /// Target cutoff for the next batch, in Hz, advancing the modulation
    /// smoother.
    fn next_cutoff(&mut self, vcf: f32, env: f32, lfo: f32) -> f32 {
        let p = &self.params;
        let mut cutoff = CUTOFF_BASE_HZ * powf(CUTOFF_SPAN, vcf);
        if p.key_tracking > 0.0 {
            if let Some(note) = self.note {
                cutoff *= exp2f((note as f32 - KEY_TRACK_CENTER) * p.key_tracking / 12.0);
            }
        }

        let target = env * p.env_amount * ENV_OCTAVES * p.vcf_polarity.sign()
            + lfo * p.lfo_to_vcf * LFO_OCTAVES
            + p.bender * p.bender_to_vcf * BENDER_OCTAVES;
        self.mod_octaves += (target - self.mod_octaves) * MOD_SMOOTHING;

        (cutoff * exp2f(self.mod_octaves)).clamp(5.0, self.sample_rate * 0.45)
    }

    /// Render and add into `out`, reading one shared LFO value per sample.
    ///
    /// Renders `min(out.len(), lfo.len())` samples. Does nothing when idle.
    pub fn render_next_block(&mut self, out: &mut [f32], lfo: &[f32]) {
        if !self.is_active() {
            return;
        }

        let len = out.len().min(lfo.len());
        let pitch_scale = self.pitch_scale();
        let mut peak = 0.0f32;
        let mut batch = [0.0f32; FILTER_BATCH];

        for (out_chunk, lfo_chunk) in out[..len]
            .chunks_mut(FILTER_BATCH)
            .zip(lfo[..len].chunks(FILTER_BATCH))
        {
            let n = out_chunk.len();

            // Modulation sampled at the head of the batch.
            let vcf = self.cutoff.get();
            let cutoff = self.next_cutoff(vcf, self.envelope.level(), self.lfo.value());
            self.vcf.set_cutoff(cutoff);
            self.vcf.set_resonance(self.resonance.get());

            for (slot, &global) in batch[..n].iter_mut().zip(lfo_chunk) {
                let voice_lfo = self.lfo.process(global);
                let env = self.envelope.advance();
                let vca = self.vca.advance();
                self.cutoff.advance();
                self.resonance.advance();
                self.dco.set_frequency(self.frequency.advance() * pitch_scale);
                *slot = self.dco.next_sample(voice_lfo) * env * self.velocity * vca;
            }

            self.hpf.process_block_inplace(&mut batch[..n]);
            self.vcf.process_block_inplace(&mut batch[..n]);

            for (dst, &sample) in out_chunk.iter_mut().zip(&batch[..n]) {
                let clean = sanitize(sample);
                peak = peak.max(clean.abs());
                *dst += soft_clip(clean * OUTPUT_GAIN);
            }
        }

        self.last_output_level = peak;
        self.track_release(len);
    }

    fn track_release(&mut self, rendered: usize) {
        if self.envelope.is_active() {
            if self.envelope.state() == EnvelopeState::Release {
                self.release_samples = self.release_samples.saturating_add(rendered as u32);
                if self.release_samples as f32 > STUCK_RELEASE_SECONDS * self.sample_rate {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(voice = self.index, "release exceeded 30 s, forcing idle");
                    self.envelope.reset();
                }
            }
        } else if self.last_output_level <= SILENCE_THRESHOLD {
            self.note = None;
            self.gate = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn render(voice: &mut Voice, samples: usize) -> f32 {
        let lfo = [0.0f32; 256];
        let mut peak = 0.0f32;
        let mut left = samples;
        while left > 0 {
            let n = left.min(256);
            let mut out = [0.0f32; 256];
            voice.render_next_block(&mut out[..n], &lfo[..n]);
            for &s in &out[..n] {
                assert!(s.is_finite());
                peak = peak.max(s.abs());
            }
            left -= n;
        }
        peak
    }

    fn voice_with(params: SynthParams) -> Voice {
        let mut voice = Voice::new(0, SR);
        voice.update_params(&params);
        voice
    }

    #[test]
    fn test_midi_to_freq_a4() {
        let freq = midi_to_freq(69);
        assert!((freq - 440.0).abs() < 0.01, "A4 should be 440 Hz, got {}", freq);
    }

    #[test]
    fn test_midi_to_freq_middle_c() {
        let freq = midi_to_freq(60);
        assert!((freq - 261.63).abs() < 0.1, "C4 should be ~261.63 Hz, got {}", freq);
    }

    #[test]
    fn test_new_voice_is_idle_and_silent() {
        let mut voice = Voice::new(0, SR);
        assert_eq!(voice.activity(), VoiceActivity::Idle);
        assert_eq!(voice.note(), None);
        let lfo = [0.0; 64];
        let mut out = [0.25; 64];
        voice.render_next_block(&mut out, &lfo);
        assert!(out.iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_note_on_produces_sound() {
        let mut voice = voice_with(SynthParams::default());
        voice.note_on(60, 1.0, false);
        let peak = render(&mut voice, 2048);
        assert!(peak > 0.01, "peak {peak}");
        assert_eq!(voice.activity(), VoiceActivity::Active);
    }

    #[test]
    fn test_release_returns_to_idle() {
        let mut voice = voice_with(SynthParams::default());
        voice.note_on(60, 1.0, false);
        render(&mut voice, 4800);
        voice.note_off();
        assert_eq!(voice.activity(), VoiceActivity::Releasing);
        render(&mut voice, 48000);
        assert_eq!(voice.activity(), VoiceActivity::Idle);
        assert_eq!(voice.note(), None);
    }

    #[test]
    fn test_retrigger_keeps_note_and_reenters_attack() {
        let mut voice = voice_with(SynthParams::default());
        voice.note_on(64, 0.5, false);
        render(&mut voice, 48000);
        assert_eq!(voice.envelope_state(), EnvelopeState::Sustain);
        let before = voice.envelope_level();

        voice.retrigger(0.9);
        assert_eq!(voice.note(), Some(64));
        assert_eq!(voice.envelope_state(), EnvelopeState::Attack);
        assert_eq!(voice.envelope_level(), before);
        assert_eq!(voice.velocity(), 0.9);
    }

    fn delayed_lfo_params(poly_mode: PolyMode) -> SynthParams {
        SynthParams {
            lfo_delay: 0.2,
            poly_mode,
            ..SynthParams::default()
        }
    }

    #[test]
    fn test_retrigger_restarts_lfo_fade() {
        let mut voice = voice_with(delayed_lfo_params(PolyMode::Poly1));
        voice.note_on(60, 1.0, false);
        render(&mut voice, 96000);
        assert_eq!(voice.lfo.fade(), 1.0);

        voice.retrigger(1.0);
        assert_eq!(voice.lfo.fade(), 0.0);
    }

    #[test]
    fn test_legato_note_restarts_lfo_fade() {
        let mut voice = voice_with(delayed_lfo_params(PolyMode::Unison));
        voice.note_on(60, 1.0, false);
        render(&mut voice, 96000);
        assert_eq!(voice.lfo.fade(), 1.0);

        voice.note_on(64, 1.0, true);
        assert_eq!(voice.lfo.fade(), 0.0);
        render(&mut voice, 4800);
        assert!(voice.lfo.fade() > 0.0 && voice.lfo.fade() < 1.0);
    }

    #[test]
    fn test_gate_mode_holds_vca_level() {
        let mut voice = voice_with(SynthParams {
            vca_mode: VcaMode::Gate,
            vca_level: 0.3,
            ..SynthParams::default()
        });
        voice.note_on(60, 1.0, false);
        render(&mut voice, 4800);
        assert_eq!(voice.envelope_level(), crate::envelope::GATE_LEVEL);
        voice.note_off();
        render(&mut voice, 4800);
        assert_eq!(voice.activity(), VoiceActivity::Idle);
    }

    #[test]
    fn test_envelope_opens_filter() {
        let mut voice = voice_with(SynthParams {
            vcf_cutoff: 0.3,
            env_amount: 1.0,
            sustain: 1.0,
            ..SynthParams::default()
        });
        let base = CUTOFF_BASE_HZ * powf(CUTOFF_SPAN, 0.3);
        voice.note_on(48, 1.0, false);
        render(&mut voice, 4800);
        assert!(voice.filter_cutoff() > base * 8.0, "cutoff {}", voice.filter_cutoff());
    }

    #[test]
    fn test_inverted_polarity_closes_filter() {
        let mut voice = voice_with(SynthParams {
            vcf_cutoff: 0.6,
            env_amount: 1.0,
            sustain: 1.0,
            vcf_polarity: crate::params::VcfPolarity::Inverted,
            ..SynthParams::default()
        });
        let base = CUTOFF_BASE_HZ * powf(CUTOFF_SPAN, 0.6);
        voice.note_on(48, 1.0, false);
        render(&mut voice, 4800);
        assert!(voice.filter_cutoff() < base / 8.0, "cutoff {}", voice.filter_cutoff());
    }

    #[test]
    fn test_unison_legato_glides() {
        let mut voice = voice_with(SynthParams {
            poly_mode: PolyMode::Unison,
            portamento_on: true,
            portamento_time: 0.1,
            ..SynthParams::default()
        });
        voice.note_on(48, 1.0, false);
        assert!((voice.frequency() - midi_to_freq(48)).abs() < 1e-3);
        voice.note_on(60, 1.0, true);
        render(&mut voice, 256);
        let f = voice.frequency();
        assert!(f > midi_to_freq(48) && f < midi_to_freq(60), "glide at {f}");
    }

    #[test]
    fn test_poly_never_glides() {
        let mut voice = voice_with(SynthParams {
            portamento_on: true,
            portamento_time: 0.5,
            ..SynthParams::default()
        });
        voice.note_on(48, 1.0, false);
        voice.note_on(60, 1.0, true);
        assert!((voice.frequency() - midi_to_freq(60)).abs() < 1e-3);
    }

    #[test]
    fn test_kill_silences_immediately() {
        let mut voice = voice_with(SynthParams::default());
        voice.note_on(60, 1.0, false);
        render(&mut voice, 512);
        voice.kill();
        assert_eq!(voice.activity(), VoiceActivity::Idle);
        assert_eq!(render(&mut voice, 512), 0.0);
    }

    #[test]
    fn test_output_is_finite_under_self_oscillation() {
        let mut voice = voice_with(SynthParams {
            resonance: 1.0,
            vcf_cutoff: 1.0,
            env_amount: 1.0,
            noise_level: 1.0,
            sub_level: 1.0,
            ..SynthParams::default()
        });
        voice.note_on(127, 1.0, false);
        let peak = render(&mut voice, 9600);
        assert!(peak <= 1.0, "tanh output stage exceeded unity: {peak}");
    }
}
