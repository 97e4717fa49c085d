// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Directory name used under the user's config, cache and pictures dirs
pub const APP_DIR_NAME: &str = "snapcam";

/// Config file name inside `<config_dir>/snapcam`
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Log file name inside `<cache_dir>/snapcam` (terminal mode only)
pub const LOG_FILE_NAME: &str = "snapcam.log";

/// Filename prefix for captured photos
pub const PHOTO_PREFIX: &str = "IMG_";

/// Extension for captured photos
pub const PHOTO_EXTENSION: &str = "jpg";

/// Preview stream geometry
///
/// High resolution is wasted on a terminal and slows down decoding, so the
/// V4L2 backend asks the driver for something close to VGA.
pub mod preview {
    /// Requested preview width in pixels
    pub const WIDTH: u32 = 640;
    /// Requested preview height in pixels
    pub const HEIGHT: u32 = 480;
    /// Number of mmap buffers for the V4L2 stream
    pub const BUFFER_COUNT: u32 = 4;
}

/// Capture timing
pub mod timing {
    use super::Duration;

    /// Default time to wait for a fresh frame when taking a photo
    pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 5_000;
    /// Poll interval while waiting for a fresh frame
    pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(16);
    /// Terminal redraw interval (~30 fps)
    pub const REDRAW_INTERVAL: Duration = Duration::from_millis(33);
    /// How long a notice stays on screen before it is dismissed
    pub const NOTICE_TIMEOUT: Duration = Duration::from_secs(4);
}

/// JPEG quality used when none is configured
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Desktop portal names
pub mod portal {
    /// Portal bus name
    pub const DESTINATION: &str = "org.freedesktop.portal.Desktop";
    /// Portal object path
    pub const PATH: &str = "/org/freedesktop/portal/desktop";
    /// Camera portal interface
    pub const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
    /// Request interface carrying the `Response` signal
    pub const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";
    /// Prefix for request object paths
    pub const REQUEST_PATH_PREFIX: &str = "/org/freedesktop/portal/desktop/request";
    /// File present inside a Flatpak sandbox
    pub const FLATPAK_INFO: &str = "/.flatpak-info";
}
