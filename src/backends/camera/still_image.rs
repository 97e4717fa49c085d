// SPDX-License-Identifier: GPL-3.0-only

//! Still image camera
//!
//! Serves a fixed image file as if it were a camera. Useful on machines
//! without a capture device and for exercising the whole flow in tests.

use super::frame_loop::LatestFrame;
use super::types::{CameraDevice, CameraFrame, CameraKind, PhotoRef};
use super::CaptureDevice;
use crate::errors::{BackendError, BackendResult, CaptureError};
use crate::storage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct StillImageCamera {
    source: PathBuf,
    output_dir: PathBuf,
    jpeg_quality: u8,
    active: Mutex<Option<String>>,
    frame: LatestFrame,
}

impl StillImageCamera {
    pub fn new(source: PathBuf, output_dir: PathBuf, jpeg_quality: u8) -> Self {
        Self {
            source,
            output_dir,
            jpeg_quality,
            active: Mutex::new(None),
            frame: LatestFrame::new(),
        }
    }

    fn device(&self) -> CameraDevice {
        let name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "still image".to_string());

        CameraDevice {
            name,
            path: self.source.display().to_string(),
            driver: Some("still-image".to_string()),
            kind: CameraKind::External,
        }
    }

    fn is_active(&self, device: &CameraDevice) -> bool {
        self.active
            .lock()
            .map(|active| active.as_deref() == Some(device.path.as_str()))
            .unwrap_or(false)
    }
}

impl CaptureDevice for StillImageCamera {
    fn enumerate(&self) -> Vec<CameraDevice> {
        if self.source.is_file() {
            vec![self.device()]
        } else {
            debug!(path = %self.source.display(), "Still image source missing");
            Vec::new()
        }
    }

    /// A still image has no facing, so any requested kind matches
    fn device_of_kind(&self, _kind: Option<CameraKind>) -> Option<CameraDevice> {
        self.enumerate().into_iter().next()
    }

    fn activate(&self, device: &CameraDevice) -> BackendResult<()> {
        if self.is_active(device) {
            return Ok(());
        }

        let image = image::open(&device.path)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        let frame = CameraFrame::from_rgb(width, height, image.into_raw())
            .ok_or_else(|| BackendError::FormatNotSupported("empty image".to_string()))?;

        self.frame.publish(frame);
        if let Ok(mut active) = self.active.lock() {
            *active = Some(device.path.clone());
        }
        info!(source = %device.path, width, height, "Still image camera active");
        Ok(())
    }

    fn deactivate(&self, device: &CameraDevice) {
        if let Ok(mut active) = self.active.lock()
            && active.as_deref() == Some(device.path.as_str())
        {
            *active = None;
            self.frame.clear();
            info!(source = %device.path, "Still image camera released");
        }
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frame.get()
    }

    async fn take_photo(&self, device: &CameraDevice) -> Result<PhotoRef, CaptureError> {
        if !self.is_active(device) {
            return Err(CaptureError::NotActive);
        }
        let frame = self.frame.get().ok_or(CaptureError::NotActive)?;
        storage::save_jpeg(frame, self.output_dir.clone(), self.jpeg_quality).await
    }
}
