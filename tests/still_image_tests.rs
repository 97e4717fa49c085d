// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end flow with the still image camera

use snapcam::app::{ScreenController, ScreenMode};
use snapcam::backends::camera::{CaptureDevice, StillImageCamera};
use snapcam::backends::permission::DeviceNodePermission;
use snapcam::errors::CaptureError;
use std::path::Path;

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("scene.png");
    let image = image::RgbImage::from_fn(32, 24, |x, y| image::Rgb([(x * 8) as u8, (y * 10) as u8, 128]));
    image.save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_full_capture_flow() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let photos = dir.path().join("photos");
    // An empty device directory counts as granted
    let dev = tempfile::tempdir().unwrap();

    let mut controller = ScreenController::new(
        DeviceNodePermission::with_dev_dir(dev.path()),
        StillImageCamera::new(source, photos.clone(), 90),
        None,
    );

    controller.initialize().await;
    assert!(controller.state().permission.is_granted());

    controller.open_camera();
    assert_eq!(controller.current_mode(), ScreenMode::CameraLive);
    let frame = controller.latest_frame().unwrap();
    assert_eq!((frame.width, frame.height), (32, 24));

    controller.capture_photo().await;
    assert_eq!(controller.current_mode(), ScreenMode::Home);
    assert!(controller.latest_frame().is_none());

    let photo = controller.state().photo.clone().unwrap();
    assert!(photo.path().starts_with(&photos));
    assert!(photo.uri().starts_with("file://"));

    let saved = image::open(photo.path()).unwrap();
    assert_eq!((saved.width(), saved.height()), (32, 24));
}

#[tokio::test]
async fn test_missing_source_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let dev = tempfile::tempdir().unwrap();

    let mut controller = ScreenController::new(
        DeviceNodePermission::with_dev_dir(dev.path()),
        StillImageCamera::new(dir.path().join("absent.png"), dir.path().to_path_buf(), 90),
        None,
    );

    controller.initialize().await;
    controller.open_camera();

    assert_eq!(controller.current_mode(), ScreenMode::DeviceUnavailable);
}

#[tokio::test]
async fn test_capture_requires_activation() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let camera = StillImageCamera::new(source, dir.path().join("photos"), 90);
    let device = camera.device_of_kind(None).unwrap();

    assert_eq!(camera.take_photo(&device).await, Err(CaptureError::NotActive));

    camera.activate(&device).unwrap();
    assert!(camera.take_photo(&device).await.is_ok());

    camera.deactivate(&device);
    assert!(camera.latest_frame().is_none());
}
