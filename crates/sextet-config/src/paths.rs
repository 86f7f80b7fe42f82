//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/sextet/` (Linux), `~/Library/Application Support/sextet/` (macOS), `%APPDATA%\sextet\` (Windows)
//!
//! # Example
//!
//! ```rust,no_run
//! use sextet_config::paths;
//!
//! if let Some(path) = paths::default_config_path() {
//!     println!("Engine config: {:?}", path);
//! }
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "sextet";

/// File name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "engine.toml";

/// Returns the user-specific configuration directory, if the platform has
/// one.
///
/// # Platform Paths
///
/// - Linux: `~/.config/sextet/`
/// - macOS: `~/Library/Application Support/sextet/`
/// - Windows: `%APPDATA%\sextet\`
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Full path of the default engine configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`](crate::ConfigError::NoConfigDir) if
/// the platform has no config directory, or an I/O error if it cannot be
/// created.
pub fn ensure_user_config_dir() -> crate::Result<PathBuf> {
    let dir = user_config_dir().ok_or(crate::ConfigError::NoConfigDir)?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_lives_under_app_dir() {
        if let (Some(dir), Some(path)) = (user_config_dir(), default_config_path()) {
            assert!(dir.to_string_lossy().contains("sextet"));
            assert_eq!(path.parent(), Some(dir.as_path()));
            assert_eq!(
                path.file_name().and_then(|n| n.to_str()),
                Some(CONFIG_FILE_NAME)
            );
        }
    }
}
