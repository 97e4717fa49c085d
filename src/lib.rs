// SPDX-License-Identifier: GPL-3.0-only

//! Snapcam - a camera screen with permission handling
//!
//! The screen is one state machine: it tracks camera permission, whether the
//! live view is wanted and the last photo taken, and derives which screen to
//! show from those. Collaborators for permission and capture sit behind
//! traits so the controller runs the same against real hardware and mocks.
//!
//! # Architecture
//!
//! - [`app`]: Screen state, reducer, controller and view content
//! - [`backends`]: Permission providers and capture devices
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo directory, file naming and JPEG output
//! - [`terminal`]: Terminal front end

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Action, ScreenController, ScreenMode, ScreenState};
pub use backends::camera::{CameraDevice, CameraKind, CaptureDevice, PhotoRef, SystemCamera};
pub use backends::permission::{PermissionProvider, PermissionState, SystemPermission};
pub use config::Config;
