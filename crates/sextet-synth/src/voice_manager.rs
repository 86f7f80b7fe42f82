//! Six-voice pool with mode-dependent allocation.
//!
//! Every note-on bumps one global timestamp and stamps the voice it lands
//! on. Allocation order:
//!
//! 1. **Unison**: all six voices take the note; legato if any key is held.
//! 2. **Retrigger**: a sounding voice already on this note re-enters Attack
//!    in place.
//! 3. **Free voice**: Poly1 searches round-robin starting after the last
//!    allocation, so a long release gets the most time before it is
//!    revisited; Poly2 and Unison take the lowest free slot.
//! 4. **Steal**: the oldest releasing voice, else the oldest voice overall.
//!
//! Allocation never fails.

use crate::params::{PolyMode, SynthParams};
use crate::voice::{Voice, VoiceActivity};

/// Size of the voice pool.
pub const NUM_VOICES: usize = 6;

/// Fixed pool of voices and its allocation state.
///
/// ```rust
/// use sextet_synth::{VoiceManager, NUM_VOICES};
///
/// let mut manager = VoiceManager::new(48000.0);
/// for note in 60..67 {
///     manager.note_on(note, 0.8);
/// }
/// // The seventh note stole the oldest voice.
/// assert_eq!(manager.active_voice_count(), NUM_VOICES);
/// assert_eq!(manager.voice(0).and_then(|v| v.note()), Some(66));
/// ```
#[derive(Debug, Clone)]
pub struct VoiceManager {
    voices: [Voice; NUM_VOICES],
    timestamps: [u64; NUM_VOICES],
    timestamp: u64,
    /// Round-robin cursor: slot of the most recent allocation.
    last_allocated: usize,
    /// Slot most recently triggered, for display.
    last_triggered: usize,
    poly_mode: PolyMode,
}

impl VoiceManager {
    /// Pool of idle voices in Poly1.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|i| Voice::new(i, sample_rate)),
            timestamps: [0; NUM_VOICES],
            timestamp: 0,
            last_allocated: NUM_VOICES - 1,
            last_triggered: 0,
            poly_mode: PolyMode::Poly1,
        }
    }

    /// Re-target every voice to a new sample rate. Silences the pool.
    pub fn prepare(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.prepare(sample_rate);
        }
        self.timestamps = [0; NUM_VOICES];
        self.last_allocated = NUM_VOICES - 1;
    }

    /// Fan a parameter snapshot out to every voice.
    pub fn update_params(&mut self, params: &SynthParams) {
        for voice in &mut self.voices {
            voice.update_params(params);
        }
    }

    /// Switch allocation policy. A different mode hard-stops every voice.
    pub fn set_poly_mode(&mut self, mode: PolyMode) {
        if mode == self.poly_mode {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(from = ?self.poly_mode, to = ?mode, "poly mode changed, resetting voices");
        self.poly_mode = mode;
        self.reset_all_voices();
    }

    /// Current allocation policy.
    pub fn poly_mode(&self) -> PolyMode {
        self.poly_mode
    }

    /// Start a note. `velocity` is in `[0, 1]`.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let note = note.min(127);
        self.timestamp += 1;

        if self.poly_mode == PolyMode::Unison {
            let legato = self.is_any_note_held();
            for (voice, stamp) in self.voices.iter_mut().zip(&mut self.timestamps) {
                voice.note_on(note, velocity, legato);
                *stamp = self.timestamp;
            }
            self.last_triggered = 0;
            return;
        }

        if let Some(i) = self
            .voices
            .iter()
            .position(|v| v.is_active() && v.note() == Some(note))
        {
            self.voices[i].retrigger(velocity);
            self.timestamps[i] = self.timestamp;
            self.last_triggered = i;
            return;
        }

        let index = match self.find_free_voice_index() {
            Some(i) => i,
            None => {
                let i = self.find_voice_to_steal();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    voice = i,
                    stolen = ?self.voices[i].note(),
                    note,
                    "voice stolen"
                );
                i
            }
        };

        self.voices[index].note_on(note, velocity, false);
        self.timestamps[index] = self.timestamp;
        self.last_allocated = index;
        self.last_triggered = index;
    }

    /// Release a note. In unison every voice on the note is released;
    /// otherwise only the first sounding voice holding it.
    pub fn note_off(&mut self, note: u8) {
        if self.poly_mode == PolyMode::Unison {
            for voice in &mut self.voices {
                if voice.note() == Some(note) {
                    voice.note_off();
                }
            }
            return;
        }

        if let Some(voice) = self
            .voices
            .iter_mut()
            .find(|v| v.is_active() && v.note() == Some(note))
        {
            voice.note_off();
        }
    }

    /// Close every gate; tails keep rendering.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.note_off();
        }
    }

    /// Hard-stop every voice.
    pub fn reset_all_voices(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
        self.timestamps = [0; NUM_VOICES];
        self.last_allocated = NUM_VOICES - 1;
        self.last_triggered = 0;
    }

    /// Free slot for a new note under the current mode, if any.
    pub fn find_free_voice_index(&self) -> Option<usize> {
        match self.poly_mode {
            PolyMode::Poly1 => (1..=NUM_VOICES)
                .map(|offset| (self.last_allocated + offset) % NUM_VOICES)
                .find(|&i| !self.voices[i].is_active()),
            PolyMode::Poly2 | PolyMode::Unison => {
                self.voices.iter().position(|v| !v.is_active())
            }
        }
    }

    /// Slot to reassign when the pool is exhausted: the oldest releasing
    /// voice, or the oldest voice if every gate is held.
    pub fn find_voice_to_steal(&self) -> usize {
        let oldest = |releasing_only: bool| {
            (0..NUM_VOICES)
                .filter(|&i| !releasing_only || !self.voices[i].is_gate_on())
                .min_by_key(|&i| self.timestamps[i])
        };
        oldest(true).or_else(|| oldest(false)).unwrap_or(0)
    }

    /// True if any key is down.
    pub fn is_any_note_held(&self) -> bool {
        self.voices.iter().any(Voice::is_gate_on)
    }

    /// Render every sounding voice, adding into `out`.
    pub fn render_next_block(&mut self, out: &mut [f32], lfo: &[f32]) {
        for voice in &mut self.voices {
            if voice.is_active() {
                voice.render_next_block(out, lfo);
            }
        }
    }

    /// Number of voices not idle.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Sum of envelope levels across sounding voices.
    pub fn total_envelope_level(&self) -> f32 {
        self.voices
            .iter()
            .filter(|v| v.is_active())
            .map(Voice::envelope_level)
            .sum()
    }

    /// Slot of the most recent note-on.
    pub fn last_triggered_voice_index(&self) -> usize {
        self.last_triggered
    }

    /// Voice in slot `index`.
    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    /// All voices.
    pub fn voices(&self) -> &[Voice; NUM_VOICES] {
        &self.voices
    }

    /// Lifecycle state of every slot.
    pub fn activities(&self) -> [VoiceActivity; NUM_VOICES] {
        core::array::from_fn(|i| self.voices[i].activity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn render(manager: &mut VoiceManager, samples: usize) {
        let lfo = [0.0f32; 512];
        let mut left = samples;
        while left > 0 {
            let n = left.min(512);
            let mut out = [0.0f32; 512];
            manager.render_next_block(&mut out[..n], &lfo[..n]);
            left -= n;
        }
    }

    fn manager_in(mode: PolyMode) -> VoiceManager {
        let mut manager = VoiceManager::new(SR);
        let params = SynthParams {
            poly_mode: mode,
            release: 0.0,
            ..SynthParams::default()
        };
        manager.set_poly_mode(mode);
        manager.update_params(&params);
        manager
    }

    fn slot_of(manager: &VoiceManager, note: u8) -> Option<usize> {
        manager
            .voices()
            .iter()
            .position(|v| v.is_gate_on() && v.note() == Some(note))
    }

    #[test]
    fn poly1_allocates_in_cyclic_order() {
        let mut m = manager_in(PolyMode::Poly1);
        m.note_on(60, 1.0);
        m.note_on(62, 1.0);
        m.note_on(64, 1.0);
        assert_eq!(slot_of(&m, 60), Some(0));
        assert_eq!(slot_of(&m, 62), Some(1));
        assert_eq!(slot_of(&m, 64), Some(2));

        // Free slot 0 and let it go idle; the cursor still moves on to 3.
        m.note_off(60);
        render(&mut m, 4800);
        assert_eq!(m.voice(0).map(Voice::activity), Some(VoiceActivity::Idle));
        m.note_on(65, 1.0);
        assert_eq!(slot_of(&m, 65), Some(3));
    }

    #[test]
    fn poly1_wraps_around() {
        let mut m = manager_in(PolyMode::Poly1);
        for note in 60..66 {
            m.note_on(note, 1.0);
        }
        m.note_off(60);
        m.note_off(61);
        render(&mut m, 4800);
        m.note_on(70, 1.0);
        assert_eq!(slot_of(&m, 70), Some(0));
        m.note_on(71, 1.0);
        assert_eq!(slot_of(&m, 71), Some(1));
    }

    #[test]
    fn poly2_takes_lowest_free() {
        let mut m = manager_in(PolyMode::Poly2);
        m.note_on(60, 1.0);
        m.note_on(62, 1.0);
        m.note_on(64, 1.0);
        m.note_off(60);
        render(&mut m, 4800);
        m.note_on(67, 1.0);
        assert_eq!(slot_of(&m, 67), Some(0));
    }

    #[test]
    fn retrigger_reuses_the_same_voice() {
        let mut m = manager_in(PolyMode::Poly1);
        m.note_on(60, 1.0);
        m.note_on(64, 1.0);
        render(&mut m, 512);
        m.note_on(60, 0.5);
        assert_eq!(slot_of(&m, 60), Some(0));
        assert_eq!(m.active_voice_count(), 2);
        assert_eq!(m.last_triggered_voice_index(), 0);
    }

    #[test]
    fn steal_prefers_releasing_voice() {
        let mut m = manager_in(PolyMode::Poly1);
        let slow = SynthParams {
            release: 1.0,
            ..SynthParams::default()
        };
        m.update_params(&slow);
        for note in 60..66 {
            m.note_on(note, 1.0);
        }
        // Let the envelopes open so the release has a tail to play.
        render(&mut m, 512);
        assert!(m.voice(5).is_some_and(|v| v.envelope_level() > 0.1));

        // Youngest voice released; still sounding.
        m.note_off(65);
        render(&mut m, 256);
        assert_eq!(m.voice(5).map(Voice::activity), Some(VoiceActivity::Releasing));

        assert_eq!(m.find_free_voice_index(), None);
        assert_eq!(m.find_voice_to_steal(), 5);
        m.note_on(72, 1.0);
        assert_eq!(slot_of(&m, 72), Some(5));
        assert_eq!(slot_of(&m, 60), Some(0));
    }

    #[test]
    fn steal_oldest_when_all_held() {
        let mut m = manager_in(PolyMode::Poly2);
        for note in 60..66 {
            m.note_on(note, 1.0);
        }
        // Restrike 60 so slot 0 is no longer the oldest.
        m.note_on(60, 1.0);
        assert_eq!(m.find_voice_to_steal(), 1);
    }

    #[test]
    fn unison_stacks_all_voices() {
        let mut m = manager_in(PolyMode::Unison);
        m.note_on(48, 1.0);
        assert_eq!(m.active_voice_count(), NUM_VOICES);
        assert!(m.voices().iter().all(|v| v.note() == Some(48)));
        assert_eq!(m.last_triggered_voice_index(), 0);

        m.note_off(48);
        assert!(m.voices().iter().all(|v| !v.is_gate_on()));
    }

    #[test]
    fn unison_second_note_is_legato() {
        let mut m = manager_in(PolyMode::Unison);
        m.note_on(48, 1.0);
        render(&mut m, 4800);
        let level = m.voice(0).map(Voice::envelope_level).unwrap_or(0.0);
        assert!(level > 0.5);
        m.note_on(55, 1.0);
        // Legato keeps the envelope level rather than restarting from zero.
        assert_eq!(m.voice(0).map(Voice::envelope_level), Some(level));
        assert!(m.voices().iter().all(|v| v.note() == Some(55)));
    }

    #[test]
    fn mode_change_resets_pool() {
        let mut m = manager_in(PolyMode::Poly1);
        m.note_on(60, 1.0);
        m.note_on(64, 1.0);
        m.set_poly_mode(PolyMode::Poly2);
        assert_eq!(m.active_voice_count(), 0);

        m.note_on(60, 1.0);
        m.set_poly_mode(PolyMode::Poly2);
        assert_eq!(m.active_voice_count(), 1);
    }

    #[test]
    fn note_off_for_unknown_note_is_ignored() {
        let mut m = manager_in(PolyMode::Poly1);
        m.note_on(60, 1.0);
        m.note_off(61);
        assert!(m.is_any_note_held());
    }

    #[test]
    fn total_envelope_level_sums_voices() {
        let mut m = manager_in(PolyMode::Poly1);
        assert_eq!(m.total_envelope_level(), 0.0);
        m.note_on(60, 1.0);
        m.note_on(64, 1.0);
        render(&mut m, 48000);
        let total = m.total_envelope_level();
        assert!((total - 1.4).abs() < 0.01, "total {total}");
    }
}
