//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::preset::is_assignable;
use crate::visca::types::DEFAULT_PORT;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub restore: RestoreConfig,
    pub replay: ReplayConfig,
}

/// Camera connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub host: String,
    /// VISCA over IP TCP port (default: 5678).
    pub port: u16,
    /// Socket read/write and connect timeout in seconds (default: 10).
    pub timeout_secs: u64,
}

/// Preset capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub start_preset: u8,
    pub end_preset: u8,
    /// Seconds to wait for camera movement (default: 10).
    pub settle_secs: u64,
    /// Seconds before checking whether a preset exists (default: 1).
    pub probe_delay_secs: u64,
    pub capture_focus: bool,
    pub output: PathBuf,
}

/// Preset restore settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Seconds to wait for the camera to reach each position (default: 10).
    pub settle_secs: u64,
    pub input: PathBuf,
}

/// Periodic command replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub interval_secs: u64,
}

/// Capture/restore settle time below which moves are likely cut short.
pub const RECOMMENDED_SETTLE_SECS: u64 = 10;

const CONFIG_FILE: &str = "config.toml";

impl AppConfig {
    /// Get config file path.
    ///
    /// `config.toml` next to the executable if present, otherwise the
    /// per-user config directory.
    pub fn default_path() -> PathBuf {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.join(CONFIG_FILE)));
        if let Some(path) = beside_exe.as_ref().filter(|p| p.exists()) {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "visca", "visca-presets")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .or(beside_exe)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.host.trim().is_empty() {
            return Err(ConfigError::Validation("Camera host cannot be empty".to_string()));
        }
        if self.camera.port == 0 {
            return Err(ConfigError::Validation("Camera port must be greater than 0".to_string()));
        }
        if self.camera.timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "Camera timeout must be at least 1 second".to_string(),
            ));
        }
        for (name, preset) in [
            ("Starting preset", self.capture.start_preset),
            ("Ending preset", self.capture.end_preset),
        ] {
            if !is_assignable(i32::from(preset)) {
                return Err(ConfigError::Validation(format!(
                    "{name} {preset} must be between 1 and 89, 100 and 149, or 152 and 254"
                )));
            }
        }
        if self.capture.start_preset > self.capture.end_preset {
            return Err(ConfigError::Validation(
                "Starting preset must be less than or equal to ending preset".to_string(),
            ));
        }
        if self.replay.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "Replay interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: DEFAULT_PORT,
            timeout_secs: 10,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            start_preset: 1,
            end_preset: 89,
            settle_secs: RECOMMENDED_SETTLE_SECS,
            probe_delay_secs: 1,
            capture_focus: false,
            output: PathBuf::from("preset_positions.json"),
        }
    }
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            settle_secs: RECOMMENDED_SETTLE_SECS,
            input: PathBuf::from("preset_positions.json"),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}
