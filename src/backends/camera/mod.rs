// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ ScreenController    │
//! └──────────┬──────────┘
//!            │  CameraSession (activate on acquire, deactivate on drop)
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureDevice trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌──────┐  ┌────────────┐
//!   │ V4L2 │  │ StillImage │
//!   └──────┘  └────────────┘
//! ```

pub mod format_converters;
pub mod frame_loop;
pub mod session;
pub mod still_image;
pub mod types;
pub mod v4l2;

pub use session::{CameraSession, with_camera};
pub use still_image::StillImageCamera;
pub use types::*;
pub use v4l2::V4l2Camera;

use crate::config::{CameraBackendType, Config};
use crate::errors::{BackendResult, CaptureError};
use std::future::Future;
use std::sync::Arc;

/// Capture device capability
///
/// Methods take `&self`: backends keep their streaming state behind
/// interior mutability so one instance can be shared (`Arc`) between the
/// controller and an in-flight capture task.
pub trait CaptureDevice: Send + Sync + 'static {
    /// Enumerate available cameras
    fn enumerate(&self) -> Vec<CameraDevice>;

    /// Find a camera facing `kind`, or any camera when `kind` is `None`
    fn device_of_kind(&self, kind: Option<CameraKind>) -> Option<CameraDevice> {
        CameraDevice::select(&self.enumerate(), kind)
    }

    /// Start streaming from `device`
    ///
    /// Activating an already active device is a no-op.
    fn activate(&self, device: &CameraDevice) -> BackendResult<()>;

    /// Stop streaming and release the device
    ///
    /// Must be safe to call on a device that is not active.
    fn deactivate(&self, device: &CameraDevice);

    /// Most recent preview frame, if streaming
    fn latest_frame(&self) -> Option<Arc<CameraFrame>>;

    /// Capture a photo from the active `device` and write it to disk
    fn take_photo(
        &self,
        device: &CameraDevice,
    ) -> impl Future<Output = Result<PhotoRef, CaptureError>> + Send;
}

/// Backend chosen from configuration
pub enum SystemCamera {
    V4l2(V4l2Camera),
    StillImage(StillImageCamera),
}

impl SystemCamera {
    /// Build the backend selected by `config`
    pub fn from_config(config: &Config) -> Self {
        let photo_dir = crate::storage::photo_directory(config);
        match (config.camera_backend, &config.still_image_path) {
            (CameraBackendType::StillImage, Some(path)) => SystemCamera::StillImage(
                StillImageCamera::new(path.clone(), photo_dir, config.jpeg_quality),
            ),
            _ => SystemCamera::V4l2(V4l2Camera::new(
                photo_dir,
                config.jpeg_quality,
                config.capture_timeout(),
            )),
        }
    }

    /// Backend type identifier
    pub fn backend_type(&self) -> CameraBackendType {
        match self {
            SystemCamera::V4l2(_) => CameraBackendType::V4l2,
            SystemCamera::StillImage(_) => CameraBackendType::StillImage,
        }
    }
}

impl CaptureDevice for SystemCamera {
    fn enumerate(&self) -> Vec<CameraDevice> {
        match self {
            SystemCamera::V4l2(camera) => camera.enumerate(),
            SystemCamera::StillImage(camera) => camera.enumerate(),
        }
    }

    fn activate(&self, device: &CameraDevice) -> BackendResult<()> {
        match self {
            SystemCamera::V4l2(camera) => camera.activate(device),
            SystemCamera::StillImage(camera) => camera.activate(device),
        }
    }

    fn deactivate(&self, device: &CameraDevice) {
        match self {
            SystemCamera::V4l2(camera) => camera.deactivate(device),
            SystemCamera::StillImage(camera) => camera.deactivate(device),
        }
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        match self {
            SystemCamera::V4l2(camera) => camera.latest_frame(),
            SystemCamera::StillImage(camera) => camera.latest_frame(),
        }
    }

    async fn take_photo(&self, device: &CameraDevice) -> Result<PhotoRef, CaptureError> {
        match self {
            SystemCamera::V4l2(camera) => camera.take_photo(device).await,
            SystemCamera::StillImage(camera) => camera.take_photo(device).await,
        }
    }
}
