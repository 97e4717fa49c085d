// SPDX-License-Identifier: GPL-3.0-only

//! State transitions
//!
//! `update` is the only place the screen state changes. It is pure: it
//! takes a snapshot and an action and returns the next snapshot together
//! with the side effect to run, if any. Re-entrant requests (a second
//! permission request or capture while one is in flight) are dropped here.

use crate::app::state::{Action, Command, Notice, ScreenMode, ScreenState};
use tracing::{debug, info, warn};

/// Apply `action` to `state`
pub fn update(state: &ScreenState, action: Action) -> (ScreenState, Command) {
    let mut next = state.clone();

    let command = match action {
        Action::Initialize => {
            if state.initialized {
                debug!("Already initialized");
                Command::None
            } else {
                next.initialized = true;
                next.pending.permission = true;
                Command::QueryPermission
            }
        }

        Action::RequestPermission => {
            if state.permission.is_granted() {
                debug!("Permission already granted");
                Command::None
            } else if state.pending.permission {
                debug!("Permission request already in flight");
                Command::None
            } else {
                next.pending.permission = true;
                Command::RequestPermission
            }
        }

        Action::PermissionResolved(permission) => {
            info!(permission = %permission, "Camera permission resolved");
            next.permission = permission;
            next.pending.permission = false;
            Command::None
        }

        Action::DeviceResolved(device) => {
            match &device {
                Some(device) => debug!(device = %device, "Camera resolved"),
                None => debug!("No matching camera"),
            }
            next.device = device;
            Command::None
        }

        Action::OpenCamera => {
            next.camera_open = true;
            Command::None
        }

        Action::CloseCamera => {
            next.camera_open = false;
            Command::None
        }

        Action::CapturePhoto => match (state.current_mode(), &state.device) {
            (_, _) if state.pending.capture => {
                debug!("Capture already in flight");
                Command::None
            }
            (ScreenMode::CameraLive, Some(device)) => {
                next.pending.capture = true;
                Command::Capture(device.clone())
            }
            (mode, _) => {
                debug!(?mode, "Capture ignored outside the live view");
                Command::None
            }
        },

        Action::CaptureFinished(result) => {
            next.pending.capture = false;
            match result {
                Ok(photo) => {
                    info!(photo = %photo, "Photo captured");
                    next.photo = Some(photo);
                    next.notice = None;
                    next.camera_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "Photo capture failed");
                    next.notice = Some(Notice::CaptureFailed(e.to_string()));
                }
            }
            Command::None
        }

        Action::DismissNotice => {
            next.notice = None;
            Command::None
        }
    };

    (next, command)
}

impl ScreenState {
    /// Next state after `action`, discarding the side effect
    pub fn reduce(&self, action: Action) -> ScreenState {
        update(self, action).0
    }
}
