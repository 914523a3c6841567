//! XDG-style location of the configuration file.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "leo";
const CONFIG_FILE: &str = "config.toml";

/// Returns the configuration directory for leo.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/leo` if `XDG_CONFIG_HOME` is set and non-empty
/// 2. `~/.config/leo` otherwise
pub fn config_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".config").join(APP_DIR))
}

/// Default path of `config.toml`.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}
