// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for captured photos

use crate::backends::camera::{CameraFrame, PhotoRef};
use crate::config::Config;
use crate::constants;
use crate::errors::CaptureError;
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Directory photos are written to
///
/// `photo_dir` from the config wins; otherwise `<Pictures>/snapcam`, falling
/// back to `$HOME/Pictures/snapcam`.
pub fn photo_directory(config: &Config) -> PathBuf {
    if let Some(dir) = &config.photo_dir {
        return dir.clone();
    }

    let pictures = dirs::picture_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join("Pictures")
    });
    pictures.join(constants::APP_DIR_NAME)
}

/// Timestamped photo filename, e.g. `IMG_20260101_120000_123.jpg`
///
/// Milliseconds keep two captures within the same second apart.
pub fn photo_filename(timestamp: DateTime<Local>) -> String {
    format!(
        "{}{}.{}",
        constants::PHOTO_PREFIX,
        timestamp.format("%Y%m%d_%H%M%S_%3f"),
        constants::PHOTO_EXTENSION
    )
}

/// Encode `frame` as JPEG into `output_dir`
///
/// Encoding and disk I/O run on the blocking pool.
pub async fn save_jpeg(
    frame: Arc<CameraFrame>,
    output_dir: PathBuf,
    quality: u8,
) -> Result<PhotoRef, CaptureError> {
    let filepath = output_dir.join(photo_filename(Local::now()));
    info!(path = %filepath.display(), width = frame.width, height = frame.height, "Saving photo");

    let target = filepath.clone();
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&output_dir)?;

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode(
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::Encoding(e.to_string()))?;

        debug!(size = buffer.len(), "Encoding complete");
        std::fs::write(&target, &buffer)?;
        Ok::<_, CaptureError>(())
    })
    .await
    .map_err(|e| CaptureError::Save(format!("save task failed: {}", e)))??;

    info!(path = %filepath.display(), "Photo saved");
    Ok(PhotoRef::new(filepath))
}

/// Decode a saved photo for on-screen preview
///
/// Returns `None` if the file is gone or cannot be decoded; the preview is
/// cosmetic and never blocks the flow.
pub async fn load_preview(photo: &PhotoRef) -> Option<Arc<CameraFrame>> {
    let path = photo.path().to_path_buf();
    debug!(path = %path.display(), "Loading photo preview");

    tokio::task::spawn_blocking(move || {
        let image = image::open(&path).ok()?.to_rgb8();
        let (width, height) = image.dimensions();
        CameraFrame::from_rgb(width, height, image.into_raw()).map(Arc::new)
    })
    .await
    .ok()?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_photo_filename_format() {
        let ts = Local
            .with_ymd_and_hms(2026, 3, 4, 5, 6, 7)
            .single()
            .unwrap();
        assert_eq!(photo_filename(ts), "IMG_20260304_050607_000.jpg");
    }

    #[test]
    fn test_configured_photo_dir_wins() {
        let config = Config {
            photo_dir: Some(PathBuf::from("/tmp/shots")),
            ..Config::default()
        };
        assert_eq!(photo_directory(&config), PathBuf::from("/tmp/shots"));
    }

    #[test]
    fn test_default_photo_dir_is_app_scoped() {
        let dir = photo_directory(&Config::default());
        assert!(dir.ends_with(constants::APP_DIR_NAME));
    }

    #[tokio::test]
    async fn test_save_then_preview() {
        let dir = tempfile::tempdir().unwrap();
        let frame = CameraFrame::from_rgb(8, 4, vec![128; 8 * 4 * 3]).unwrap();

        let photo = save_jpeg(Arc::new(frame), dir.path().join("nested"), 90)
            .await
            .unwrap();
        assert!(photo.path().exists());
        assert_eq!(photo.path().extension().and_then(|e| e.to_str()), Some("jpg"));

        let preview = load_preview(&photo).await.unwrap();
        assert_eq!((preview.width, preview.height), (8, 4));
    }

    #[tokio::test]
    async fn test_preview_of_missing_file() {
        assert!(load_preview(&PhotoRef::new("/nonexistent/IMG.jpg")).await.is_none());
    }
}
