// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos

use snapcam::Config;
use snapcam::backends::camera::{CameraKind, CaptureDevice, SystemCamera, with_camera};
use snapcam::backends::permission::{PermissionProvider, PermissionState, SystemPermission};
use snapcam::errors::{AppError, AppResult, BackendError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// List all available cameras
pub fn list_cameras(config: &Config, json: bool) -> AppResult<()> {
    let camera = SystemCamera::from_config(config);
    let cameras = camera.enumerate();

    if json {
        let out = serde_json::to_string_pretty(&cameras)
            .map_err(|e| AppError::Other(format!("Failed to serialize cameras: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {}", camera.kind, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        println!();
    }

    Ok(())
}

/// Take a photo with the camera of `kind`
pub fn take_photo(
    mut config: Config,
    kind: Option<CameraKind>,
    output: Option<PathBuf>,
) -> AppResult<()> {
    // Capture next to the requested file so the final rename stays on one filesystem
    let rename_to = match output {
        Some(path) if path.is_dir() => {
            config.photo_dir = Some(path);
            None
        }
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.photo_dir = Some(parent.to_path_buf());
            }
            Some(path)
        }
        None => None,
    };

    let kind = kind.or(config.camera_kind);
    let permission = SystemPermission::from_backend(config.permission_backend);
    let camera = Arc::new(SystemCamera::from_config(&config));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let photo = rt.block_on(async {
        ensure_access(&permission).await?;

        let device = camera.device_of_kind(kind).ok_or_else(|| {
            BackendError::DeviceNotFound(match kind {
                Some(kind) => format!("no {} camera", kind),
                None => "no camera".to_string(),
            })
        })?;
        println!("Using camera: {}", device);
        println!("Capturing...");

        let photo = with_camera(&camera, &device, |camera, device| async move {
            camera.take_photo(&device).await
        })
        .await??;
        Ok::<_, AppError>(photo)
    })?;

    // If user specified a specific filename, rename the file
    if let Some(user_path) = rename_to {
        std::fs::rename(photo.path(), &user_path)?;
        println!("Photo saved: {}", user_path.display());
        return Ok(());
    }

    println!("Photo saved: {}", photo.path().display());
    Ok(())
}

/// Query permission and ask for it once if missing
async fn ensure_access(permission: &SystemPermission) -> AppResult<()> {
    let state = permission.query_status().await.unwrap_or_else(|e| {
        warn!(error = %e, "Permission query failed");
        PermissionState::Denied
    });
    if state.is_granted() {
        return Ok(());
    }

    println!("Requesting camera access ({})...", permission.name());
    match permission.request_access().await {
        Ok(PermissionState::Granted) => Ok(()),
        Ok(PermissionState::Denied) => Err(AppError::AccessDenied),
        Err(e) => {
            warn!(error = %e, "Permission request failed");
            Err(AppError::AccessDenied)
        }
    }
}
