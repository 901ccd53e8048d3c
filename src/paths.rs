//! Path resolution for ssoplan
//!
//! # Environment Variables
//!
//! - `SSOPLAN_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/ssoplan`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `SSOPLAN_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/ssoplan` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\ssoplan`
//!    - macOS/Linux: `~/.config/ssoplan`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "SSOPLAN_CONFIG_DIR";

/// Default configuration file name inside the config directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Get the ssoplan config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("ssoplan");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("ssoplan");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("ssoplan");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// The configuration file to read: `explicit` if given, else the default
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(config_dir()?.join(DEFAULT_CONFIG_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
