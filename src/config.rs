// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Loaded once at startup from `<config_dir>/snapcam/config.toml`. A missing
//! file yields the defaults.

use crate::backends::camera::CameraKind;
use crate::constants::{self, timing};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Which capture backend to drive
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackendType {
    /// Video4Linux2 capture nodes
    #[default]
    V4l2,
    /// A fixed image file served as a camera
    StillImage,
}

/// Which permission provider to ask
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionBackendType {
    /// Portal inside a sandbox, device nodes otherwise
    #[default]
    Auto,
    /// XDG desktop portal
    Portal,
    /// `/dev/video*` access checks
    DeviceNode,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Capture backend
    pub camera_backend: CameraBackendType,
    /// Image served by the still-image backend
    pub still_image_path: Option<PathBuf>,
    /// Camera facing to look for; `None` takes the first camera
    pub camera_kind: Option<CameraKind>,
    /// Permission provider
    pub permission_backend: PermissionBackendType,
    /// Where photos are written; `None` uses `<Pictures>/snapcam`
    pub photo_dir: Option<PathBuf>,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Maximum wait for a fresh frame when taking a photo
    pub capture_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_backend: CameraBackendType::default(),
            still_image_path: None,
            camera_kind: None,
            permission_backend: PermissionBackendType::default(),
            photo_dir: None,
            jpeg_quality: constants::DEFAULT_JPEG_QUALITY,
            capture_timeout_ms: timing::DEFAULT_CAPTURE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/snapcam/config.toml` on Linux via `dirs::config_dir()`.
    /// Falls back to the current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir
            .join(constants::APP_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME)
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::parse(&content).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::ParseError { path, source },
            ParseFailure::Invalid(err) => err,
        })
    }

    /// Parses and validates TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::ParseError {
                path: PathBuf::from("<inline>"),
                source,
            },
            ParseFailure::Invalid(err) => err,
        })
    }

    fn parse(content: &str) -> Result<Self, ParseFailure> {
        let config: Config = toml::from_str(content).map_err(ParseFailure::Toml)?;
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::ValidationError {
                message: format!("jpeg_quality must be 1-100, got {}", self.jpeg_quality),
            });
        }

        if self.capture_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "capture_timeout_ms must be greater than zero".to_string(),
            });
        }

        if self.camera_backend == CameraBackendType::StillImage && self.still_image_path.is_none()
        {
            return Err(ConfigError::ValidationError {
                message: "camera_backend = \"still-image\" requires still_image_path".to_string(),
            });
        }

        Ok(())
    }

    /// Capture timeout as a `Duration`
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_toml(
            r#"
            camera_backend = "still-image"
            still_image_path = "/tmp/test.png"
            camera_kind = "front"
            permission_backend = "device-node"
            photo_dir = "/tmp/photos"
            jpeg_quality = 80
            capture_timeout_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.camera_backend, CameraBackendType::StillImage);
        assert_eq!(config.camera_kind, Some(CameraKind::Front));
        assert_eq!(config.permission_backend, PermissionBackendType::DeviceNode);
        assert_eq!(config.photo_dir, Some(PathBuf::from("/tmp/photos")));
        assert_eq!(config.capture_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_rejects_bad_quality() {
        let err = Config::from_toml("jpeg_quality = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Config::from_toml("capture_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_still_image_requires_path() {
        let err = Config::from_toml("camera_backend = \"still-image\"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = Config::from_toml("resolution = \"4k\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
