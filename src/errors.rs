// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application
//!
//! Permission refusal and a missing camera are steady states of the screen
//! model, not errors. The types here only describe collaborator failures,
//! which the controller converts into those steady states or into a
//! user-visible notice.

use thiserror::Error;

pub use crate::config::ConfigError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type for permission provider operations
pub type PermissionResult<T> = Result<T, PermissionError>;

/// Top-level error used by the binary entry points
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Camera error: {0}")]
    Camera(#[from] BackendError),
    #[error("Photo error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),
    #[error("Camera access was denied")]
    AccessDenied,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Permission provider failures
///
/// These never reach the user directly: a provider that cannot answer is
/// treated as having denied access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// D-Bus session bus or portal unreachable
    #[error("Portal unavailable: {0}")]
    PortalUnavailable(String),
    /// Portal answered with something we could not parse
    #[error("Unexpected portal response: {0}")]
    InvalidResponse(String),
    /// Device node inspection failed
    #[error("Failed to inspect camera devices: {0}")]
    DeviceScan(String),
}

/// Camera backend failures (enumeration, activation)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No camera devices found
    #[error("Camera not found: {0}")]
    DeviceNotFound(String),
    /// Device could not be opened or configured
    #[error("Camera initialization failed: {0}")]
    InitializationFailed(String),
    /// Camera is busy or in use
    #[error("Camera is busy")]
    Busy,
    /// Device offers no pixel format we can decode
    #[error("Unsupported format: {0}")]
    FormatNotSupported(String),
}

/// Photo capture failures
///
/// Recoverable: the live view stays open and the user may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Capture requested on a device that is not streaming
    #[error("Camera is not active")]
    NotActive,
    /// No fresh frame arrived within the capture timeout
    #[error("Timed out waiting for a frame")]
    Timeout,
    /// Hardware or driver error
    #[error("Camera device error: {0}")]
    Device(String),
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
    /// Save failed
    #[error("Save failed: {0}")]
    Save(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Save(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Encoding(err.to_string())
    }
}

impl From<zbus::Error> for PermissionError {
    fn from(err: zbus::Error) -> Self {
        PermissionError::PortalUnavailable(err.to_string())
    }
}
