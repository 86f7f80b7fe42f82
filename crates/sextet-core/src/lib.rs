//! Sextet Core - DSP primitives for the sextet synthesis engine
//!
//! Small, allocation-free building blocks shared by the voice and effect
//! code. Everything here is `no_std` (with `libm` for math) and safe to call
//! from an audio callback once constructed.
//!
//! # Building Blocks
//!
//! ## Processing Trait
//!
//! - [`Effect`] - Object-safe mono processor with block helpers
//!
//! ## Parameter Smoothing
//!
//! - [`SmoothedParam`] - Exponential approach (also used for glide and slew)
//! - [`LinearSmoothedParam`] - Fixed-duration linear ramps
//!
//! ## Filters
//!
//! - [`LadderFilter`] - 24 dB/oct TPT ladder low-pass with drive
//! - [`Biquad`] / [`BiquadCoefficients`] - RBJ cookbook sections
//! - [`OnePole`] - 6 dB/oct low/high-pass
//! - [`DcBlocker`] - First-order DC removal
//!
//! ## Time and Modulation
//!
//! - [`DelayLine`] - Circular buffer with linear fractional reads
//! - [`Lfo`] - Sine/triangle phase accumulator
//! - [`Xorshift32`] - Per-consumer noise and random source
//!
//! ## Utilities
//!
//! - [`sanitize`], [`flush_denormal`], [`soft_clip`], [`wet_dry_mix`]
//! - [`fast_math`] approximations for control-rate exponentials and prewarp
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! sextet-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod fast_math;
pub mod ladder;
pub mod lfo;
pub mod math;
pub mod noise;
pub mod one_pole;
pub mod param;

pub use biquad::{Biquad, BiquadCoefficients};
pub use dc_blocker::DcBlocker;
pub use delay::DelayLine;
pub use effect::Effect;
pub use fast_math::{fast_exp2, fast_tan};
pub use ladder::LadderFilter;
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    cents_to_ratio, fast_tanh, flush_denormal, lerp, sanitize, semitones_to_ratio, soft_clip,
    wet_dry_mix,
};
pub use noise::Xorshift32;
pub use one_pole::OnePole;
pub use param::{LinearSmoothedParam, SmoothedParam};
