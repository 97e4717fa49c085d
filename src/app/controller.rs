// SPDX-License-Identifier: GPL-3.0-only

//! Screen state controller
//!
//! Owns the current [`ScreenState`], feeds actions through the reducer and
//! turns the resulting [`Command`]s into futures against the permission
//! provider and capture device. After every transition it reconciles the
//! camera session with the derived screen: a session is held exactly while
//! the live view is shown.
//!
//! Two ways to drive it:
//!
//! - event loops call [`ScreenController::dispatch`], spawn the future from
//!   [`ScreenController::perform`] and dispatch its result when it lands;
//! - sequential callers (CLI, tests) use the async operation methods, which
//!   do the same round trip inline.

use crate::app::state::{Action, Command, ScreenMode, ScreenState};
use crate::app::update::update;
use crate::backends::camera::{CameraFrame, CameraKind, CameraSession, CaptureDevice};
use crate::backends::permission::{PermissionProvider, PermissionState};
use crate::errors::PermissionResult;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{error, warn};

pub struct ScreenController<P: PermissionProvider, D: CaptureDevice> {
    state: ScreenState,
    permission: Arc<P>,
    camera: Arc<D>,
    camera_kind: Option<CameraKind>,
    session: Option<CameraSession<D>>,
}

impl<P: PermissionProvider, D: CaptureDevice> ScreenController<P, D> {
    pub fn new(permission: P, camera: D, camera_kind: Option<CameraKind>) -> Self {
        Self::with_shared(Arc::new(permission), Arc::new(camera), camera_kind)
    }

    /// Build from collaborators the caller keeps a handle to
    pub fn with_shared(permission: Arc<P>, camera: Arc<D>, camera_kind: Option<CameraKind>) -> Self {
        Self {
            state: ScreenState::default(),
            permission,
            camera,
            camera_kind,
            session: None,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn current_mode(&self) -> ScreenMode {
        self.state.current_mode()
    }

    /// Whether the camera is currently activated
    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Latest preview frame while the live view is shown
    pub fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.session.as_ref().and_then(|_| self.camera.latest_frame())
    }

    /// Apply `action` and return the side effect it asks for
    pub fn dispatch(&mut self, action: Action) -> Command {
        let (next, command) = update(&self.state, action);
        self.state = next;
        self.sync_camera();
        command
    }

    /// Future that carries out `command` and yields the completion action
    ///
    /// The future owns what it needs, so it can be spawned.
    pub fn perform(&self, command: Command) -> Option<BoxFuture<'static, Action>> {
        match command {
            Command::None => None,
            Command::QueryPermission => {
                let provider = Arc::clone(&self.permission);
                Some(
                    async move {
                        let result = provider.query_status().await;
                        Action::PermissionResolved(granted_or_denied(result, "query"))
                    }
                    .boxed(),
                )
            }
            Command::RequestPermission => {
                let provider = Arc::clone(&self.permission);
                Some(
                    async move {
                        let result = provider.request_access().await;
                        Action::PermissionResolved(granted_or_denied(result, "request"))
                    }
                    .boxed(),
                )
            }
            Command::Capture(device) => {
                let camera = Arc::clone(&self.camera);
                Some(
                    async move { Action::CaptureFinished(camera.take_photo(&device).await) }
                        .boxed(),
                )
            }
        }
    }

    /// Dispatch `action` and run its side effects to completion
    pub async fn run(&mut self, action: Action) {
        let mut command = self.dispatch(action);
        while let Some(task) = self.perform(command) {
            let completion = task.await;
            command = self.dispatch(completion);
        }
    }

    /// Look up the configured camera kind and record the result
    pub fn resolve_device(&mut self) {
        let device = self.camera.device_of_kind(self.camera_kind);
        self.dispatch(Action::DeviceResolved(device));
    }

    /// Query permission and look up the camera; only the first call does anything
    pub async fn initialize(&mut self) {
        if self.state.initialized {
            return;
        }
        self.resolve_device();
        self.run(Action::Initialize).await;
    }

    pub async fn request_permission(&mut self) {
        self.run(Action::RequestPermission).await;
    }

    pub fn open_camera(&mut self) {
        self.resolve_device();
        self.dispatch(Action::OpenCamera);
    }

    pub fn close_camera(&mut self) {
        self.dispatch(Action::CloseCamera);
    }

    pub async fn capture_photo(&mut self) {
        self.run(Action::CapturePhoto).await;
    }

    pub fn dismiss_notice(&mut self) {
        self.dispatch(Action::DismissNotice);
    }

    /// Hold a session iff the live view is shown
    fn sync_camera(&mut self) {
        let wanted = self.state.live_device().cloned();
        let held = self.session.as_ref().map(|s| s.device().clone());
        if wanted == held {
            return;
        }

        // Dropping the old session deactivates it
        self.session = None;

        if let Some(device) = wanted {
            match CameraSession::acquire(Arc::clone(&self.camera), device) {
                Ok(session) => self.session = Some(session),
                Err(e) => {
                    error!(error = %e, "Failed to activate camera");
                    // Show the device as unavailable rather than a dead preview
                    let (next, _) = update(&self.state, Action::DeviceResolved(None));
                    self.state = next;
                }
            }
        }
    }
}

/// Provider failures count as a refusal
fn granted_or_denied(result: PermissionResult<PermissionState>, operation: &str) -> PermissionState {
    result.unwrap_or_else(|e| {
        warn!(operation, error = %e, "Permission provider failed, treating as denied");
        PermissionState::Denied
    })
}

impl<P: PermissionProvider, D: CaptureDevice> std::fmt::Debug for ScreenController<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenController")
            .field("state", &self.state)
            .field("camera_kind", &self.camera_kind)
            .field("session", &self.session)
            .finish()
    }
}
