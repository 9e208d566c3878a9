// Configuration module for trail-recorder
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut RecorderConfig) -> Result<()> {
    if let Ok(offline_dir) = std::env::var("TRAIL_RECORDER_OFFLINE_DIR") {
        match config.storage.backend_config.as_filesystem_mut() {
            Some(filesystem) => filesystem.base_path = offline_dir,
            None => warn!(
                "TRAIL_RECORDER_OFFLINE_DIR ignored: storage backend is '{}'",
                config.storage.backend
            ),
        }
    }

    if let Ok(tick_ms) = std::env::var("TRAIL_RECORDER_TICK_MS") {
        config.recorder.tick_interval_ms = tick_ms
            .parse()
            .with_context(|| format!("Invalid TRAIL_RECORDER_TICK_MS '{}'", tick_ms))?;
    }

    ConfigLoader::validate(config)
}
