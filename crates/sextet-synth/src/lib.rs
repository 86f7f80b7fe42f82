//! Sextet Synth - six-voice analog-modeling synthesis engine
//!
//! This crate is the sound engine of a classic six-voice polysynth: one
//! digitally controlled oscillator per voice, a resonant ladder low-pass,
//! an ADSR shared by filter and amplifier, a single phase-locked LFO, and a
//! bucket-brigade ensemble on the summed output.
//!
//! # Core Components
//!
//! ## Oscillator
//!
//! - [`Dco`] - Saw, pulse/PWM, sub-octave and noise with polyBLEP edges,
//!   pitch quantised to the reference hardware's timer clock
//!
//! ```rust
//! use sextet_synth::{Dco, SynthParams};
//!
//! let mut dco = Dco::new(48000.0, 1);
//! dco.apply_params(&SynthParams::default());
//! dco.set_frequency(220.0);
//! let sample = dco.next_sample(0.0);
//! assert!(sample.is_finite());
//! ```
//!
//! ## Envelope
//!
//! - [`AdsrEnvelope`] - Exponential-segment ADSR with gate mode
//! - [`EnvelopeState`] - Stage tracking
//!
//! ```rust
//! use sextet_synth::{AdsrEnvelope, EnvelopeState};
//!
//! let mut env = AdsrEnvelope::new(48000.0);
//! env.set_times(0.005, 0.2, 0.7, 0.3);
//! env.restart();
//! let level = env.advance();
//! assert_eq!(env.state(), EnvelopeState::Attack);
//! assert!(level > 0.0);
//! ```
//!
//! ## Voices
//!
//! - [`Voice`] - DCO → HPF → VCF → VCA chain
//! - [`VoiceManager`] - Fixed pool of [`NUM_VOICES`] with Poly1 / Poly2 /
//!   Unison assignment and release-first stealing
//! - [`MasterLfo`] / [`VoiceLfo`] - Shared LFO phase, per-voice delay
//!
//! ## Output
//!
//! - [`Ensemble`] - BBD chorus, modes I, II and I+II
//! - [`SynthEngine`] - Everything wired together, with the sustain queue
//!   ([`PerformanceState`]) and lock-free parameter handoff
//!   ([`param_channel`])
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible with `alloc`. Disable the default `std`
//! feature:
//!
//! ```toml
//! [dependencies]
//! sextet-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example: Playing a Chord
//!
//! ```rust
//! use sextet_synth::{ChorusMode, SynthEngine, SynthParams};
//!
//! let mut engine = SynthEngine::new(48000.0, 512);
//! engine.set_params(SynthParams {
//!     chorus: ChorusMode::I,
//!     vcf_cutoff: 0.6,
//!     ..SynthParams::default()
//! });
//!
//! engine.note_on(60, 0.9); // C4
//! engine.note_on(64, 0.9); // E4
//! engine.note_on(67, 0.9); // G4
//!
//! let mut left = vec![0.0; 1024];
//! let mut right = vec![0.0; 1024];
//! engine.render_stereo(&mut left, &mut right);
//! assert_eq!(engine.active_voice_count(), 3);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod engine;
pub mod ensemble;
pub mod envelope;
pub mod handoff;
pub mod lfo;
pub mod oscillator;
pub mod params;
pub mod performance;
pub mod voice;
pub mod voice_manager;

// Re-export main types at crate root
pub use engine::SynthEngine;
pub use ensemble::{BbdLine, Ensemble};
pub use envelope::{AdsrEnvelope, EnvelopeState};
pub use handoff::{ParamPublisher, ParamReceiver, param_channel};
pub use lfo::{MasterLfo, VoiceLfo};
pub use oscillator::Dco;
pub use params::{
    ChorusMode, DcoRange, HpfMode, PolyMode, PwmMode, SynthParams, VcaMode, VcfPolarity,
};
pub use performance::{PerformanceState, SustainPedal};
pub use voice::{Voice, VoiceActivity, midi_to_freq};
pub use voice_manager::{NUM_VOICES, VoiceManager};
