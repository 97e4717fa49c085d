// SPDX-License-Identifier: GPL-3.0-only

//! Scoped camera activation
//!
//! A [`CameraSession`] activates a device when it is created and
//! deactivates it when dropped, so every way out of the live view
//! (close, capture, permission loss, error, panic) releases the camera.

use super::{CameraDevice, CaptureDevice};
use crate::errors::BackendResult;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// RAII guard for an active camera
pub struct CameraSession<D: CaptureDevice> {
    backend: Arc<D>,
    device: CameraDevice,
}

impl<D: CaptureDevice> CameraSession<D> {
    /// Activate `device` on `backend`
    pub fn acquire(backend: Arc<D>, device: CameraDevice) -> BackendResult<Self> {
        backend.activate(&device)?;
        info!(device = %device.name, "Camera session started");
        Ok(Self { backend, device })
    }

    /// Device held by this session
    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    /// Backend the device belongs to
    pub fn backend(&self) -> &Arc<D> {
        &self.backend
    }
}

impl<D: CaptureDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        debug!(device = %self.device.name, "Releasing camera session");
        self.backend.deactivate(&self.device);
        info!(device = %self.device.name, "Camera session ended");
    }
}

impl<D: CaptureDevice> std::fmt::Debug for CameraSession<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("device", &self.device)
            .finish()
    }
}

/// Run `body` with `device` active, deactivating it on every exit path
///
/// Activation failure is returned as the outer error; `body`'s own result
/// is passed through untouched.
pub async fn with_camera<D, F, Fut, T>(
    backend: &Arc<D>,
    device: &CameraDevice,
    body: F,
) -> BackendResult<T>
where
    D: CaptureDevice,
    F: FnOnce(Arc<D>, CameraDevice) -> Fut,
    Fut: Future<Output = T>,
{
    let session = CameraSession::acquire(Arc::clone(backend), device.clone())?;
    let result = body(Arc::clone(session.backend()), session.device().clone()).await;
    drop(session);
    Ok(result)
}
