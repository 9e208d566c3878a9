// Configuration types for trail-recorder

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub recorder: RecorderSettings,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Recording engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderSettings {
    /// Period between sample productions
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Samples retained per subscriber before a slow one starts skipping
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl RecorderSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Sample source selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Source type: "simulated", "replay"
    #[serde(default = "default_source_kind")]
    pub kind: String,

    #[serde(default)]
    pub simulated: SimulatedSourceConfig,

    #[serde(default)]
    pub replay: Option<ReplaySourceConfig>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            simulated: SimulatedSourceConfig::default(),
            replay: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatedSourceConfig {
    #[serde(default = "default_origin_latitude")]
    pub origin_latitude: f64,
    #[serde(default = "default_origin_longitude")]
    pub origin_longitude: f64,
    #[serde(default = "default_origin_altitude")]
    pub origin_altitude_m: f64,

    /// Degrees added to latitude and longitude per fix
    #[serde(default = "default_step_degrees")]
    pub step_degrees: f64,

    #[serde(default = "default_climb_per_tick")]
    pub climb_per_tick_m: f64,

    #[serde(default = "default_max_samples")]
    pub max_samples: u32,

    #[serde(default = "default_horizontal_accuracy")]
    pub horizontal_accuracy_m: f64,
    #[serde(default = "default_vertical_accuracy")]
    pub vertical_accuracy_m: f64,
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            origin_latitude: default_origin_latitude(),
            origin_longitude: default_origin_longitude(),
            origin_altitude_m: default_origin_altitude(),
            step_degrees: default_step_degrees(),
            climb_per_tick_m: default_climb_per_tick(),
            max_samples: default_max_samples(),
            horizontal_accuracy_m: default_horizontal_accuracy(),
            vertical_accuracy_m: default_vertical_accuracy(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplaySourceConfig {
    /// JSON file with a sample array or a completed recording
    pub path: String,
}

/// Manifest storage configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend type: "filesystem", "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub on_corrupt: CorruptManifestPolicy,

    /// Backend-specific configuration
    #[serde(flatten)]
    pub backend_config: BackendConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            on_corrupt: CorruptManifestPolicy::default(),
            backend_config: BackendConfig::Filesystem {
                filesystem: FilesystemConfig::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BackendConfig {
    Filesystem {
        #[serde(rename = "filesystem")]
        filesystem: FilesystemConfig,
    },
    Memory {},
}

impl BackendConfig {
    pub fn as_filesystem(&self) -> Option<&FilesystemConfig> {
        match self {
            BackendConfig::Filesystem { filesystem } => Some(filesystem),
            _ => None,
        }
    }

    pub fn as_filesystem_mut(&mut self) -> Option<&mut FilesystemConfig> {
        match self {
            BackendConfig::Filesystem { filesystem } => Some(filesystem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    /// Empty means the platform application-support directory
    #[serde(default)]
    pub base_path: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            manifest_file: default_manifest_file(),
        }
    }
}

impl FilesystemConfig {
    pub fn resolve_base_path(&self) -> PathBuf {
        if self.base_path.is_empty() {
            default_offline_root()
        } else {
            PathBuf::from(&self.base_path)
        }
    }
}

/// What to do when the manifest on disk cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptManifestPolicy {
    /// Surface `ManifestCorrupt` to the caller
    #[default]
    Fail,
    /// Move the bad file aside and start with an empty store
    Discard,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,  // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String,  // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// `<application support>/Offline`, or `./Offline` when the platform has no
/// home directory
pub fn default_offline_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "trail-recorder")
        .map(|dirs| dirs.data_dir().join("Offline"))
        .unwrap_or_else(|| PathBuf::from("Offline"))
}

// Default value functions
fn default_tick_interval_ms() -> u64 { 200 }
fn default_broadcast_capacity() -> usize { 256 }
fn default_source_kind() -> String { "simulated".to_string() }
fn default_origin_latitude() -> f64 { 47.6062 }
fn default_origin_longitude() -> f64 { -122.3321 }
fn default_origin_altitude() -> f64 { 200.0 }
fn default_step_degrees() -> f64 { 0.0001 }
fn default_climb_per_tick() -> f64 { 0.5 }
fn default_max_samples() -> u32 { 512 }
fn default_horizontal_accuracy() -> f64 { 5.0 }
fn default_vertical_accuracy() -> f64 { 8.0 }
fn default_backend() -> String { "filesystem".to_string() }
fn default_manifest_file() -> String { "manifest.json".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
