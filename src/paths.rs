//! Inventory path resolution
//!
//! # Path Resolution Priority
//!
//! 1. `--config` flag
//! 2. `CONVERGE_CONFIG` environment variable (read by clap into the same flag)
//! 3. Platform config directory:
//!    - Linux: `$XDG_CONFIG_HOME/converge/inventory.toml` or `~/.config/converge/inventory.toml`
//!    - macOS: `~/Library/Application Support/converge/inventory.toml`
//!    - Windows: `%APPDATA%\converge\inventory.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the inventory file
pub const ENV_CONFIG: &str = "CONVERGE_CONFIG";

/// File name of the inventory inside the config directory
pub const INVENTORY_FILE: &str = "inventory.toml";

/// Get the converge config directory path
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let path = base.join("converge");
    log::debug!("Using config dir: {}", path.display());
    Ok(path)
}

/// Resolve the inventory file from an explicit path or the default location
pub fn inventory_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            let path = expand(&path.to_string_lossy());
            log::debug!("Using inventory from --config/{}: {}", ENV_CONFIG, path.display());
            Ok(path)
        }
        None => Ok(config_dir()?.join(INVENTORY_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
