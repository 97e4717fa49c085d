// SPDX-License-Identifier: GPL-3.0-only

//! Application state management
//!
//! The whole screen is described by one immutable [`ScreenState`] value.
//! It only changes through [`crate::app::update::update`]; the displayed
//! screen is derived from it by [`ScreenState::current_mode`].

use crate::backends::camera::{CameraDevice, PhotoRef};
use crate::backends::permission::PermissionState;
use crate::errors::CaptureError;

/// Which screen is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenMode {
    /// Last photo (or placeholder) and an "open camera" affordance
    Home,
    /// Live preview with capture and close
    CameraLive,
    /// Camera requested without permission; offers grant and back
    PermissionBlocked,
    /// Camera requested but none of the wanted kind exists; offers back
    DeviceUnavailable,
}

impl ScreenMode {
    pub const ALL: [ScreenMode; 4] = [
        ScreenMode::Home,
        ScreenMode::CameraLive,
        ScreenMode::PermissionBlocked,
        ScreenMode::DeviceUnavailable,
    ];

    /// Derive the screen from its three inputs
    ///
    /// Total over all inputs. CameraLive requires a grant and a device.
    pub fn derive(permission: PermissionState, camera_open: bool, device_available: bool) -> Self {
        match (permission, camera_open, device_available) {
            (_, false, _) => ScreenMode::Home,
            (PermissionState::Denied, true, _) => ScreenMode::PermissionBlocked,
            (PermissionState::Granted, true, true) => ScreenMode::CameraLive,
            (PermissionState::Granted, true, false) => ScreenMode::DeviceUnavailable,
        }
    }
}

/// Transient message shown over the current screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CaptureFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::CaptureFailed(reason) => format!("Failed to take photo: {}", reason),
        }
    }
}

/// In-flight async actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub permission: bool,
    pub capture: bool,
}

/// Immutable snapshot of everything the screen depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenState {
    pub permission: PermissionState,
    pub camera_open: bool,
    /// Camera of the configured kind, if one exists
    pub device: Option<CameraDevice>,
    /// Most recent capture
    pub photo: Option<PhotoRef>,
    pub notice: Option<Notice>,
    pub pending: Pending,
    /// Startup permission query has been issued
    pub initialized: bool,
}

impl ScreenState {
    pub fn current_mode(&self) -> ScreenMode {
        ScreenMode::derive(self.permission, self.camera_open, self.device.is_some())
    }

    /// Device to stream from, only while the live view is shown
    pub fn live_device(&self) -> Option<&CameraDevice> {
        match self.current_mode() {
            ScreenMode::CameraLive => self.device.as_ref(),
            _ => None,
        }
    }
}

/// Everything that can happen to the screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Startup: query permission once
    Initialize,
    /// User asked for camera access
    RequestPermission,
    /// Permission provider answered (query or request)
    PermissionResolved(PermissionState),
    /// Camera lookup finished
    DeviceResolved(Option<CameraDevice>),
    OpenCamera,
    CloseCamera,
    CapturePhoto,
    /// Capture device answered
    CaptureFinished(Result<PhotoRef, CaptureError>),
    DismissNotice,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    QueryPermission,
    RequestPermission,
    Capture(CameraDevice),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraKind;

    const PERMISSIONS: [PermissionState; 2] = [PermissionState::Denied, PermissionState::Granted];

    #[test]
    fn test_derive_is_total() {
        let mut seen = std::collections::HashSet::new();
        for permission in PERMISSIONS {
            for camera_open in [false, true] {
                for device in [false, true] {
                    let mode = ScreenMode::derive(permission, camera_open, device);
                    assert!(ScreenMode::ALL.contains(&mode));
                    seen.insert(mode);
                }
            }
        }
        // Every screen is reachable from some input
        assert_eq!(seen.len(), ScreenMode::ALL.len());
    }

    #[test]
    fn test_live_requires_grant_and_device() {
        for permission in PERMISSIONS {
            for camera_open in [false, true] {
                for device in [false, true] {
                    if ScreenMode::derive(permission, camera_open, device) == ScreenMode::CameraLive {
                        assert!(permission.is_granted());
                        assert!(device);
                        assert!(camera_open);
                    }
                }
            }
        }
    }

    #[test]
    fn test_closed_camera_is_always_home() {
        for permission in PERMISSIONS {
            for device in [false, true] {
                assert_eq!(ScreenMode::derive(permission, false, device), ScreenMode::Home);
            }
        }
    }

    #[test]
    fn test_denied_wins_over_missing_device() {
        assert_eq!(
            ScreenMode::derive(PermissionState::Denied, true, false),
            ScreenMode::PermissionBlocked
        );
    }

    #[test]
    fn test_live_device_only_in_live_mode() {
        let device = CameraDevice {
            name: "cam".to_string(),
            path: "/dev/video0".to_string(),
            driver: None,
            kind: CameraKind::Back,
        };
        let mut state = ScreenState {
            permission: PermissionState::Granted,
            device: Some(device.clone()),
            ..ScreenState::default()
        };
        assert!(state.live_device().is_none());

        state.camera_open = true;
        assert_eq!(state.live_device(), Some(&device));
    }
}
