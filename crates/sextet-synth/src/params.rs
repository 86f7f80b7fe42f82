//! Flat parameter snapshot for the engine.
//!
//! [`SynthParams`] is a plain `Copy` value. The engine reads one snapshot per
//! block and copies it into every voice, so nothing in the render path ever
//! observes a half-updated patch. Normalized controls are `f32` in `[0, 1]`
//! and are mapped to physical units by the accessor methods below
//! ([`attack_seconds`](SynthParams::attack_seconds),
//! [`lfo_rate_hz`](SynthParams::lfo_rate_hz), ...).

/// Attack time range in seconds.
pub const ATTACK_RANGE: (f32, f32) = (0.001, 3.0);
/// Decay time range in seconds.
pub const DECAY_RANGE: (f32, f32) = (0.001, 12.0);
/// Release time range in seconds.
pub const RELEASE_RANGE: (f32, f32) = (0.001, 12.0);

/// Longest LFO fade-in, in seconds.
pub const MAX_LFO_DELAY_SECONDS: f32 = 5.0;
/// Longest portamento time constant, in seconds.
pub const MAX_PORTAMENTO_SECONDS: f32 = 5.0;

/// Mod wheel contribution to vibrato depth.
const MOD_WHEEL_TO_DCO: f32 = 0.3;

/// Cubic time curve: fine resolution near the short end of the range.
#[inline]
pub fn cubic_time(normalized: f32, (min, max): (f32, f32)) -> f32 {
    let p = normalized.clamp(0.0, 1.0);
    min + (max - min) * p * p * p
}

/// Oscillator footage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DcoRange {
    /// One octave down.
    Feet16,
    /// Concert pitch.
    #[default]
    Feet8,
    /// One octave up.
    Feet4,
}

impl DcoRange {
    /// Frequency multiplier for this footage.
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Feet16 => 0.5,
            Self::Feet8 => 1.0,
            Self::Feet4 => 2.0,
        }
    }

    /// Map a selector index (0, 1, 2); out-of-range values clamp.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Feet16,
            1 => Self::Feet8,
            _ => Self::Feet4,
        }
    }
}

/// Pulse width source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PwmMode {
    /// Width follows the shared LFO.
    #[default]
    Lfo,
    /// Width fixed by the PWM control.
    Manual,
}

impl PwmMode {
    /// Map a selector index; anything non-zero selects manual.
    pub fn from_index(index: u32) -> Self {
        if index == 0 { Self::Lfo } else { Self::Manual }
    }
}

/// High-pass / bass stage ahead of the VCF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HpfMode {
    /// 80 Hz low shelf, +6 dB.
    #[default]
    BassBoost,
    /// 10 Hz high-pass (effectively flat).
    Flat,
    /// 225 Hz high-pass.
    Low,
    /// 450 Hz high-pass.
    High,
}

impl HpfMode {
    /// Map a selector index (0..=3); out-of-range values clamp.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::BassBoost,
            1 => Self::Flat,
            2 => Self::Low,
            _ => Self::High,
        }
    }
}

/// Direction of envelope modulation on the VCF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VcfPolarity {
    /// Envelope opens the filter.
    #[default]
    Normal,
    /// Envelope closes the filter.
    Inverted,
}

impl VcfPolarity {
    /// Map a selector index; anything non-zero selects inverted.
    pub fn from_index(index: u32) -> Self {
        if index == 0 { Self::Normal } else { Self::Inverted }
    }

    /// Sign applied to envelope modulation.
    pub fn sign(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Inverted => -1.0,
        }
    }
}

/// VCA control source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VcaMode {
    /// Amplitude follows the ADSR.
    #[default]
    Envelope,
    /// Amplitude follows the key gate at `vca_level`.
    Gate,
}

impl VcaMode {
    /// Map a selector index; anything non-zero selects gate.
    pub fn from_index(index: u32) -> Self {
        if index == 0 { Self::Envelope } else { Self::Gate }
    }
}

/// Ensemble (BBD chorus) setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChorusMode {
    /// Dry signal on both channels.
    #[default]
    Off,
    /// Slow, shallow line.
    I,
    /// Faster, deeper line.
    II,
    /// Both lines in parallel.
    Both,
}

impl ChorusMode {
    /// Map a selector index (0..=3); out-of-range values clamp.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Off,
            1 => Self::I,
            2 => Self::II,
            _ => Self::Both,
        }
    }
}

/// Voice assignment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolyMode {
    /// Round-robin over free voices, starting after the last allocation.
    #[default]
    Poly1,
    /// Lowest free voice first.
    Poly2,
    /// All six voices play the same note.
    Unison,
}

impl PolyMode {
    /// Map the hardware selector (1, 2, 3). Out-of-range values clamp.
    pub fn from_selector(selector: u32) -> Self {
        match selector {
            0 | 1 => Self::Poly1,
            2 => Self::Poly2,
            _ => Self::Unison,
        }
    }

    /// Hardware selector number (1, 2, 3).
    pub fn selector(self) -> u32 {
        match self {
            Self::Poly1 => 1,
            Self::Poly2 => 2,
            Self::Unison => 3,
        }
    }
}

/// Complete patch and performance state consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Oscillator footage.
    pub dco_range: DcoRange,
    /// Sawtooth enabled.
    pub saw_on: bool,
    /// Pulse enabled.
    pub pulse_on: bool,
    /// Pulse width amount.
    pub pwm: f32,
    /// Pulse width source.
    pub pwm_mode: PwmMode,
    /// Sub-octave square level.
    pub sub_level: f32,
    /// Noise level.
    pub noise_level: f32,
    /// Vibrato depth.
    pub lfo_to_dco: f32,
    /// High-pass / bass stage.
    pub hpf_mode: HpfMode,
    /// VCF cutoff.
    pub vcf_cutoff: f32,
    /// VCF resonance.
    pub resonance: f32,
    /// Envelope to VCF depth.
    pub env_amount: f32,
    /// LFO to VCF depth.
    pub lfo_to_vcf: f32,
    /// Keyboard tracking amount.
    pub key_tracking: f32,
    /// Envelope polarity on the VCF.
    pub vcf_polarity: VcfPolarity,
    /// VCA control source.
    pub vca_mode: VcaMode,
    /// Gate-mode output level.
    pub vca_level: f32,
    /// Attack time (cubic, see [`ATTACK_RANGE`]).
    pub attack: f32,
    /// Decay time (cubic, see [`DECAY_RANGE`]).
    pub decay: f32,
    /// Sustain level.
    pub sustain: f32,
    /// Release time (cubic, see [`RELEASE_RANGE`]).
    pub release: f32,
    /// LFO rate.
    pub lfo_rate: f32,
    /// Per-voice LFO fade-in time.
    pub lfo_delay: f32,
    /// Ensemble mode.
    pub chorus: ChorusMode,
    /// Voice assignment policy.
    pub poly_mode: PolyMode,
    /// Pitch bender position in `[-1, 1]`.
    pub bender: f32,
    /// Bender depth on pitch, in octaves at full throw.
    pub bender_to_dco: f32,
    /// Bender depth on the VCF.
    pub bender_to_vcf: f32,
    /// Modulation wheel.
    pub mod_wheel: f32,
    /// Portamento enabled (unison only).
    pub portamento_on: bool,
    /// Glide only between overlapping notes.
    pub portamento_legato: bool,
    /// Portamento time.
    pub portamento_time: f32,
    /// Master tune in cents, `[-100, 100]`.
    pub tune: f32,
    /// Analog pitch drift amount.
    pub drift: f32,
    /// Output gain.
    pub master_level: f32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            dco_range: DcoRange::Feet8,
            saw_on: true,
            pulse_on: true,
            pwm: 0.5,
            pwm_mode: PwmMode::Lfo,
            sub_level: 0.0,
            noise_level: 0.0,
            lfo_to_dco: 0.0,
            hpf_mode: HpfMode::BassBoost,
            vcf_cutoff: 0.8,
            resonance: 0.0,
            env_amount: 0.5,
            lfo_to_vcf: 0.0,
            key_tracking: 0.0,
            vcf_polarity: VcfPolarity::Normal,
            vca_mode: VcaMode::Envelope,
            vca_level: 0.8,
            attack: 0.01,
            decay: 0.3,
            sustain: 0.7,
            release: 0.3,
            lfo_rate: 0.5,
            lfo_delay: 0.0,
            chorus: ChorusMode::Off,
            poly_mode: PolyMode::Poly1,
            bender: 0.0,
            bender_to_dco: 1.0,
            bender_to_vcf: 0.0,
            mod_wheel: 0.0,
            portamento_on: false,
            portamento_legato: true,
            portamento_time: 0.0,
            tune: 0.0,
            drift: 0.0,
            master_level: 0.8,
        }
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
fn unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Clamp to `[lo, hi]`, mapping NaN to 0.
#[inline]
fn bounded(x: f32, lo: f32, hi: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(lo, hi) }
}

impl SynthParams {
    /// Copy with every field restricted to its documented range.
    ///
    /// Enumerated fields are valid by construction.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            pwm: unit(self.pwm),
            sub_level: unit(self.sub_level),
            noise_level: unit(self.noise_level),
            lfo_to_dco: unit(self.lfo_to_dco),
            vcf_cutoff: unit(self.vcf_cutoff),
            resonance: unit(self.resonance),
            env_amount: unit(self.env_amount),
            lfo_to_vcf: unit(self.lfo_to_vcf),
            key_tracking: unit(self.key_tracking),
            vca_level: unit(self.vca_level),
            attack: unit(self.attack),
            decay: unit(self.decay),
            sustain: unit(self.sustain),
            release: unit(self.release),
            lfo_rate: unit(self.lfo_rate),
            lfo_delay: unit(self.lfo_delay),
            bender: bounded(self.bender, -1.0, 1.0),
            bender_to_dco: unit(self.bender_to_dco),
            bender_to_vcf: unit(self.bender_to_vcf),
            mod_wheel: unit(self.mod_wheel),
            portamento_time: unit(self.portamento_time),
            tune: bounded(self.tune, -100.0, 100.0),
            drift: unit(self.drift),
            master_level: unit(self.master_level),
            ..*self
        }
    }

    /// Copy with performance modulation folded in.
    ///
    /// The mod wheel deepens vibrato (scaled by 0.3) and the VCF LFO amount.
    #[must_use]
    pub fn modulated(&self) -> Self {
        Self {
            lfo_to_dco: (self.lfo_to_dco + self.mod_wheel * MOD_WHEEL_TO_DCO).min(1.0),
            lfo_to_vcf: (self.lfo_to_vcf + self.mod_wheel).min(1.0),
            ..*self
        }
    }

    /// Attack segment length.
    pub fn attack_seconds(&self) -> f32 {
        cubic_time(self.attack, ATTACK_RANGE)
    }

    /// Decay segment length.
    pub fn decay_seconds(&self) -> f32 {
        cubic_time(self.decay, DECAY_RANGE)
    }

    /// Release segment length.
    pub fn release_seconds(&self) -> f32 {
        cubic_time(self.release, RELEASE_RANGE)
    }

    /// Master LFO rate, 0.1 to 30 Hz.
    pub fn lfo_rate_hz(&self) -> f32 {
        0.1 * libm::powf(300.0, unit(self.lfo_rate))
    }

    /// Per-voice LFO fade-in.
    pub fn lfo_delay_seconds(&self) -> f32 {
        unit(self.lfo_delay) * MAX_LFO_DELAY_SECONDS
    }

    /// Glide time constant; zero snaps.
    pub fn portamento_seconds(&self) -> f32 {
        unit(self.portamento_time) * MAX_PORTAMENTO_SECONDS
    }
}
