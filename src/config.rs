// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{CameraBackendType, CameraFacing};
use crate::constants::{APP_NAME, burst, photo, timing};
use crate::errors::{AppError, AppResult};
use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config file name inside the app config directory
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera backend to use
    pub backend: CameraBackendType,
    /// Facing selected at startup
    pub default_facing: CameraFacing,
    /// Flash mode selected at startup
    pub default_flash_mode: FlashMode,
    /// Flash controls enabled (capability flag)
    pub flash_control: bool,
    /// Tap-to-focus enabled (capability flag)
    pub tap_to_focus: bool,
    /// Burst interval in milliseconds
    pub burst_interval_ms: u64,
    /// Refresh the gallery thumbnail once a burst has ended
    pub refresh_after_burst: bool,
    /// Photo directory override (default: ~/Pictures/shutter)
    pub photo_dir: Option<PathBuf>,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// How long transient notices stay visible, in milliseconds
    pub notice_duration_ms: u64,
    /// Device node of the front camera (V4L2), overrides name detection
    pub front_camera_path: Option<String>,
    /// Device node of the back camera (V4L2), overrides name detection
    pub back_camera_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            default_facing: CameraFacing::Back,
            default_flash_mode: FlashMode::Off,
            flash_control: true,
            tap_to_focus: true,
            burst_interval_ms: burst::INTERVAL.as_millis() as u64,
            refresh_after_burst: true,
            photo_dir: None,
            jpeg_quality: photo::DEFAULT_JPEG_QUALITY,
            notice_duration_ms: timing::NOTICE_DURATION.as_millis() as u64,
            front_camera_path: None,
            back_camera_path: None,
        }
    }
}

impl Config {
    /// Burst interval, never below the minimum
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms).max(burst::MIN_INTERVAL)
    }

    /// Notice lifetime
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Load from the default location; falls back to defaults on any error
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, logging and returning defaults when missing or malformed
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(AppError::Storage(e)) if !path.exists() => {
                info!(path = %path.display(), reason = %e, "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Save to the default location
    pub fn save(&self) -> AppResult<()> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("no config directory available".to_string()))?;
        self.save_to(&path)
    }
}
