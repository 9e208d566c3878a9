// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse YAML text, substituting environment variables first
    pub fn parse(content: &str) -> Result<RecorderConfig> {
        let content = Self::substitute_env_vars(content);

        let config: RecorderConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${OFFLINE_DIR:-/tmp/offline} -> /tmp/offline (if OFFLINE_DIR not set)
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub fn validate(config: &RecorderConfig) -> Result<()> {
        if config.recorder.tick_interval_ms == 0 {
            bail!("recorder.tick_interval_ms must be > 0");
        }

        if config.recorder.broadcast_capacity == 0 {
            bail!("recorder.broadcast_capacity must be > 0");
        }

        match config.source.kind.as_str() {
            "simulated" => {
                if config.source.simulated.max_samples == 0 {
                    bail!("source.simulated.max_samples must be > 0");
                }
            }
            "replay" => match &config.source.replay {
                Some(replay) if !replay.path.is_empty() => {}
                Some(_) => bail!("source.replay.path cannot be empty"),
                None => bail!("replay source selected but replay config missing"),
            },
            unknown => bail!("Unknown source kind: '{}'. Supported: simulated, replay", unknown),
        }

        match config.storage.backend.as_str() {
            "filesystem" => {
                let filesystem = config
                    .storage
                    .backend_config
                    .as_filesystem()
                    .context("filesystem backend selected but filesystem config missing")?;
                if filesystem.manifest_file.is_empty() {
                    bail!("storage.filesystem.manifest_file cannot be empty");
                }
            }
            "memory" => {}
            unknown => bail!("Unknown backend: '{}'. Supported: filesystem, memory", unknown),
        }

        match config.logging.format.as_str() {
            "text" | "json" => {}
            unknown => bail!("Unknown logging.format: '{}'. Supported: text, json", unknown),
        }

        Ok(())
    }
}
