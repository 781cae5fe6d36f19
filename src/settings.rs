//! Movement settings with persistence
//!
//! Settings are read from `~/.config/tether/movement.toml` unless a path
//! is given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tether_game::ControllerConfig;
use tracing::{info, warn};

/// Get the config directory path
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tether"))
}

/// Default location of the movement settings file
pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("movement.toml"))
}

/// Load movement settings, falling back to defaults on any problem
pub fn load(path: Option<&Path>) -> ControllerConfig {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(path) = default_path() else {
                warn!("Could not determine config directory");
                return ControllerConfig::default();
            };
            path
        }
    };

    if !path.exists() {
        info!("No movement settings at {:?}, using defaults", path);
        return ControllerConfig::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => match ControllerConfig::from_toml_str(&content) {
            Ok(config) => {
                info!("Loaded movement settings from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to parse movement settings: {}, using defaults", e);
                ControllerConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read movement settings: {}, using defaults", e);
            ControllerConfig::default()
        }
    }
}

/// Save movement settings to `path`, or the default location
pub fn save(config: &ControllerConfig, path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_path().context("Could not determine config directory")?,
    };

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let content = config.to_toml_string()?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved movement settings to {:?}", path);
    Ok(path)
}
