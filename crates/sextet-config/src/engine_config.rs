//! Engine configuration file.
//!
//! The engine configuration covers the host-facing settings that are fixed
//! for a session (sample rate, block size, channel count, sustain pedal
//! wiring) plus the startup voice mode and output level. Sound parameters
//! are not part of it.
//!
//! # File Format
//!
//! ```toml
//! sample_rate = 48000
//! max_block_size = 512
//! channels = 2
//! poly_mode = "poly1"      # "poly1", "poly2" or "unison"
//! sustain_inverted = false
//! sustain_queue_capacity = 128
//! master_level = 0.8
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use crate::error::{ConfigError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use sextet_synth::{PolyMode, SynthEngine, SynthParams};
use std::path::Path;

/// Accepted sample rates in Hz.
pub const SAMPLE_RATE_RANGE: (u32, u32) = (8000, 192_000);
/// Accepted block sizes in samples.
pub const BLOCK_SIZE_RANGE: (usize, usize) = (1, 8192);
/// Accepted sustain queue capacities.
pub const SUSTAIN_QUEUE_RANGE: (usize, usize) = (8, 1024);

/// Voice assignment mode as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolyModeSetting {
    /// Round-robin polyphony.
    #[default]
    Poly1,
    /// Lowest-free-slot polyphony.
    Poly2,
    /// All voices on one note.
    Unison,
}

impl From<PolyModeSetting> for PolyMode {
    fn from(setting: PolyModeSetting) -> Self {
        match setting {
            PolyModeSetting::Poly1 => PolyMode::Poly1,
            PolyModeSetting::Poly2 => PolyMode::Poly2,
            PolyModeSetting::Unison => PolyMode::Unison,
        }
    }
}

impl From<PolyMode> for PolyModeSetting {
    fn from(mode: PolyMode) -> Self {
        match mode {
            PolyMode::Poly1 => PolyModeSetting::Poly1,
            PolyMode::Poly2 => PolyModeSetting::Poly2,
            PolyMode::Unison => PolyModeSetting::Unison,
        }
    }
}

/// Session settings for a [`SynthEngine`].
///
/// # Example
///
/// ```rust
/// use sextet_config::{EngineConfig, PolyModeSetting};
///
/// let config = EngineConfig::from_toml_str("poly_mode = \"unison\"\nchannels = 1").unwrap();
/// assert_eq!(config.poly_mode, PolyModeSetting::Unison);
/// assert_eq!(config.sample_rate, 48000);
///
/// let engine = config.build_engine().unwrap();
/// assert_eq!(engine.max_block_size(), 512);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Largest block the host will render at once.
    pub max_block_size: usize,
    /// Output channels, 1 or 2.
    pub channels: u16,
    /// Voice assignment at startup.
    pub poly_mode: PolyModeSetting,
    /// Reverse CC64 polarity for normally-closed pedals.
    pub sustain_inverted: bool,
    /// Note-offs the sustain pedal can hold back.
    pub sustain_queue_capacity: usize,
    /// Output level at startup, 0 to 1.
    pub master_level: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            max_block_size: 512,
            channels: 2,
            poly_mode: PolyModeSetting::Poly1,
            sustain_inverted: false,
            sustain_queue_capacity: sextet_synth::performance::DEFAULT_QUEUE_CAPACITY,
            master_level: SynthParams::default().master_level,
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate, then write to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = SAMPLE_RATE_RANGE;
        if !(lo..=hi).contains(&self.sample_rate) {
            return Err(ConfigError::validation(
                "sample_rate",
                format!("{} Hz is outside {lo}..={hi}", self.sample_rate),
            ));
        }

        let (lo, hi) = BLOCK_SIZE_RANGE;
        if !(lo..=hi).contains(&self.max_block_size) {
            return Err(ConfigError::validation(
                "max_block_size",
                format!("{} is outside {lo}..={hi}", self.max_block_size),
            ));
        }

        if !matches!(self.channels, 1 | 2) {
            return Err(ConfigError::validation(
                "channels",
                format!("{} is not 1 (mono) or 2 (stereo)", self.channels),
            ));
        }

        let (lo, hi) = SUSTAIN_QUEUE_RANGE;
        if !(lo..=hi).contains(&self.sustain_queue_capacity) {
            return Err(ConfigError::validation(
                "sustain_queue_capacity",
                format!("{} is outside {lo}..={hi}", self.sustain_queue_capacity),
            ));
        }

        if !(0.0..=1.0).contains(&self.master_level) {
            return Err(ConfigError::validation(
                "master_level",
                format!("{} is outside 0..=1", self.master_level),
            ));
        }

        Ok(())
    }

    /// Default config file location.
    pub fn default_path() -> Result<std::path::PathBuf> {
        paths::default_config_path().ok_or(ConfigError::NoConfigDir)
    }

    /// Load the default config file, or defaults if there is none.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default() -> Result<Self> {
        match paths::default_config_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Starting parameters implied by this config.
    pub fn initial_params(&self) -> SynthParams {
        SynthParams {
            poly_mode: self.poly_mode.into(),
            master_level: self.master_level,
            ..SynthParams::default()
        }
    }

    /// Validate and build a prepared engine.
    pub fn build_engine(&self) -> Result<SynthEngine> {
        self.validate()?;
        let mut engine = SynthEngine::new(self.sample_rate as f32, self.max_block_size)
            .with_sustain_capacity(self.sustain_queue_capacity);
        engine.set_sustain_inverted(self.sustain_inverted);
        engine.set_params(self.initial_params());
        Ok(engine)
    }
}
