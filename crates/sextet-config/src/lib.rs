//! Configuration for the sextet synthesizer engine.
//!
//! This crate loads, validates and saves the engine's session settings as
//! TOML, and turns them into a ready-to-render [`SynthEngine`].
//!
//! # Features
//!
//! - **Engine config**: sample rate, block size, channel layout, startup
//!   voice mode, sustain pedal wiring and output level
//! - **Validation**: every field is range-checked; errors name the field
//! - **Paths**: platform-specific config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use sextet_config::EngineConfig;
//!
//! // Load the user's config, falling back to defaults
//! let config = EngineConfig::load_or_default().unwrap();
//!
//! // Build an engine from it
//! let mut engine = config.build_engine().unwrap();
//! engine.note_on(60, 0.8);
//!
//! // Save a copy
//! config.save("engine.toml").unwrap();
//! ```

mod engine_config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use engine_config::{
    BLOCK_SIZE_RANGE, EngineConfig, PolyModeSetting, SAMPLE_RATE_RANGE, SUSTAIN_QUEUE_RANGE,
};
pub use error::{ConfigError, Result};
pub use paths::{default_config_path, ensure_user_config_dir, user_config_dir};

/// Re-export the engine type built by [`EngineConfig::build_engine`].
pub use sextet_synth::SynthEngine;
