//! ADSR envelope generator.
//!
//! Each segment is a one-pole approach toward its goal, updated per sample
//! with a precomputed coefficient `exp(-1 / (τ · fs))`. The time constant is a
//! fifth of the segment time, so a segment is audibly complete by the end of
//! its nominal duration. Attack aims past full scale (1.08) and stops at 1.0,
//! giving the hard-kneed rise of a capacitor charged toward an overshoot rail.
//!
//! In gate mode the segments collapse and the output is a plain gate follower
//! at 0.97.

use libm::expf;

/// Attack aims here and stops at 1.0.
const ATTACK_TARGET: f32 = 1.08;

/// Distance at which decay snaps to sustain and release snaps to zero.
const SETTLE_THRESHOLD: f32 = 1e-4;

/// Segment time constant as a fraction of the nominal segment time.
const TIME_CONSTANT_RATIO: f32 = 0.2;

/// Time constant for following sustain changes while held, in seconds.
const SUSTAIN_FOLLOW_SECONDS: f32 = 0.01;

/// Output level while gated in gate mode.
pub const GATE_LEVEL: f32 = 0.97;

/// Shortest accepted segment time, in seconds.
const MIN_SEGMENT_SECONDS: f32 = 0.0005;

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising toward full scale.
    Attack,
    /// Falling from full scale toward the sustain level.
    Decay,
    /// Holding the sustain level while gated.
    Sustain,
    /// Falling toward zero after the gate closed.
    Release,
}

/// ADSR envelope generator.
///
/// ```rust
/// use sextet_synth::{AdsrEnvelope, EnvelopeState};
///
/// let mut env = AdsrEnvelope::new(48000.0);
/// env.set_times(0.005, 0.2, 0.6, 0.3);
/// env.restart();
/// for _ in 0..4800 {
///     env.advance();
/// }
/// assert_ne!(env.state(), EnvelopeState::Attack);
///
/// env.gate_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,

    attack_seconds: f32,
    decay_seconds: f32,
    release_seconds: f32,
    sustain: f32,

    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
    sustain_coeff: f32,

    gate_mode: bool,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl AdsrEnvelope {
    /// Idle envelope with 1 ms attack, 300 ms decay, 0.7 sustain and
    /// 300 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate: sample_rate.max(1.0),
            attack_seconds: 0.001,
            decay_seconds: 0.3,
            release_seconds: 0.3,
            sustain: 0.7,
            attack_coeff: 0.0,
            decay_coeff: 0.0,
            release_coeff: 0.0,
            sustain_coeff: 0.0,
            gate_mode: false,
        };
        env.recalculate_coefficients();
        env
    }

    /// Set all four segments at once. Times are in seconds.
    ///
    /// Coefficients are only recomputed for segments that changed, so this is
    /// cheap to call once per block.
    pub fn set_times(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        let attack = attack.max(MIN_SEGMENT_SECONDS);
        let decay = decay.max(MIN_SEGMENT_SECONDS);
        let release = release.max(MIN_SEGMENT_SECONDS);

        if attack != self.attack_seconds {
            self.attack_seconds = attack;
            self.attack_coeff = self.segment_coeff(attack);
        }
        if decay != self.decay_seconds {
            self.decay_seconds = decay;
            self.decay_coeff = self.segment_coeff(decay);
        }
        if release != self.release_seconds {
            self.release_seconds = release;
            self.release_coeff = self.segment_coeff(release);
        }
        self.sustain = sustain.clamp(0.0, 1.0);
    }

    /// Attack time in seconds.
    pub fn attack_seconds(&self) -> f32 {
        self.attack_seconds
    }

    /// Decay time in seconds.
    pub fn decay_seconds(&self) -> f32 {
        self.decay_seconds
    }

    /// Sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Release time in seconds.
    pub fn release_seconds(&self) -> f32 {
        self.release_seconds
    }

    /// Switch between articulated envelope and gate follower.
    pub fn set_gate_mode(&mut self, enabled: bool) {
        self.gate_mode = enabled;
    }

    /// True when acting as a gate follower.
    pub fn is_gate_mode(&self) -> bool {
        self.gate_mode
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.recalculate_coefficients();
    }

    /// Start a fresh note: level drops to zero and Attack begins.
    pub fn restart(&mut self) {
        self.level = 0.0;
        self.state = EnvelopeState::Attack;
    }

    /// Re-enter Attack from the current level (retrigger without a click).
    pub fn gate_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Enter Release from any non-idle state.
    pub fn gate_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
        }
    }

    /// Force idle.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Level produced by the last [`advance`](Self::advance).
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True unless idle.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.gate_mode {
            return self.advance_gate();
        }

        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.level = ATTACK_TARGET + (self.level - ATTACK_TARGET) * self.attack_coeff;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                self.level = self.sustain + (self.level - self.sustain) * self.decay_coeff;
                if (self.level - self.sustain).abs() < SETTLE_THRESHOLD {
                    self.level = self.sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain + (self.level - self.sustain) * self.sustain_coeff;
            }

            EnvelopeState::Release => {
                self.level *= self.release_coeff;
                if self.level < SETTLE_THRESHOLD {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }

        self.level
    }

    fn advance_gate(&mut self) -> f32 {
        self.level = match self.state {
            EnvelopeState::Idle => 0.0,
            EnvelopeState::Release => {
                self.state = EnvelopeState::Idle;
                0.0
            }
            EnvelopeState::Attack | EnvelopeState::Decay | EnvelopeState::Sustain => {
                self.state = EnvelopeState::Sustain;
                GATE_LEVEL
            }
        };
        self.level
    }

    fn segment_coeff(&self, seconds: f32) -> f32 {
        let tau_samples = seconds * TIME_CONSTANT_RATIO * self.sample_rate;
        expf(-1.0 / tau_samples.max(1e-3))
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = self.segment_coeff(self.attack_seconds);
        self.decay_coeff = self.segment_coeff(self.decay_seconds);
        self.release_coeff = self.segment_coeff(self.release_seconds);
        self.sustain_coeff = expf(-1.0 / (SUSTAIN_FOLLOW_SECONDS * self.sample_rate));
    }
}
