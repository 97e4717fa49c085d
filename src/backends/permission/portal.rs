// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal camera permission
//!
//! Talks to `org.freedesktop.portal.Camera` on the session bus. Access is
//! requested with `AccessCamera`, whose answer arrives asynchronously as a
//! `Response` signal on a request object the portal creates for us.

use super::device_node::DeviceNodePermission;
use super::{PermissionProvider, PermissionState};
use crate::constants::portal;
use crate::errors::{PermissionError, PermissionResult};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

/// Portal response code meaning the user allowed the request
const RESPONSE_SUCCESS: u32 = 0;

/// Whether we run inside a Flatpak sandbox
pub fn is_sandboxed() -> bool {
    Path::new(portal::FLATPAK_INFO).exists()
}

pub struct PortalPermission {
    /// Set once `AccessCamera` succeeded in this process
    granted: AtomicBool,
    /// Distinguishes request tokens from the same process
    request_counter: AtomicU32,
}

impl PortalPermission {
    pub fn new() -> Self {
        Self {
            granted: AtomicBool::new(false),
            request_counter: AtomicU32::new(0),
        }
    }

    fn next_token(&self) -> String {
        let n = self.request_counter.fetch_add(1, Ordering::Relaxed);
        format!("snapcam_{}_{}", std::process::id(), n)
    }

    async fn camera_proxy(connection: &zbus::Connection) -> PermissionResult<zbus::Proxy<'static>> {
        Ok(zbus::Proxy::new(
            connection,
            portal::DESTINATION,
            portal::PATH,
            portal::CAMERA_INTERFACE,
        )
        .await?)
    }

    async fn access_camera(
        &self,
        connection: &zbus::Connection,
        camera: &zbus::Proxy<'static>,
    ) -> PermissionResult<PermissionState> {
        let token = self.next_token();
        let sender = connection
            .unique_name()
            .ok_or_else(|| PermissionError::PortalUnavailable("no unique bus name".to_string()))?;
        let request_path = request_path(sender.as_str(), &token);

        // Subscribe before calling so the response cannot slip past us
        let request = zbus::Proxy::new(
            connection,
            portal::DESTINATION,
            request_path.as_str(),
            portal::REQUEST_INTERFACE,
        )
        .await?;
        let mut responses = request.receive_signal("Response").await?;

        let mut options: HashMap<&str, Value> = HashMap::new();
        options.insert("handle_token", Value::new(token.as_str()));

        let handle: OwnedObjectPath = camera.call("AccessCamera", &(options,)).await?;
        if handle.as_str() != request_path {
            // Old portals ignore handle_token; our subscription would never fire
            warn!(expected = %request_path, actual = %handle, "Portal returned unexpected request path");
            return Err(PermissionError::InvalidResponse(format!(
                "request path mismatch: {}",
                handle
            )));
        }

        let message = responses.next().await.ok_or_else(|| {
            PermissionError::InvalidResponse("response stream closed".to_string())
        })?;
        let (response, _results): (u32, HashMap<String, OwnedValue>) = message
            .body()
            .deserialize()
            .map_err(|e| PermissionError::InvalidResponse(e.to_string()))?;

        let state = PermissionState::from(response == RESPONSE_SUCCESS);
        info!(response, state = %state, "Portal camera access answered");
        Ok(state)
    }
}

impl Default for PortalPermission {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionProvider for PortalPermission {
    async fn query_status(&self) -> PermissionResult<PermissionState> {
        if self.granted.load(Ordering::SeqCst) {
            return Ok(PermissionState::Granted);
        }
        if !is_sandboxed() {
            // The portal has no query call; on the host the device nodes decide
            return DeviceNodePermission::new().query_status().await;
        }
        // Inside the sandbox access must be requested before it is known
        Ok(PermissionState::Denied)
    }

    async fn request_access(&self) -> PermissionResult<PermissionState> {
        let connection = zbus::Connection::session().await?;
        let camera = Self::camera_proxy(&connection).await?;

        let present = match camera.get_property::<bool>("IsCameraPresent").await {
            Ok(present) => Some(present),
            Err(e) => {
                debug!(error = %e, "Could not read IsCameraPresent");
                None
            }
        };
        if let Some(state) = presence_shortcut(present) {
            info!("Portal reports no camera, skipping AccessCamera");
            return Ok(state);
        }

        let state = self.access_camera(&connection, &camera).await?;
        self.granted.store(state.is_granted(), Ordering::SeqCst);
        Ok(state)
    }
}

/// Answer to give without asking the portal, from its `IsCameraPresent`
///
/// With no camera there is nothing to grant access to; reporting Granted
/// lets device resolution show the camera as unavailable instead. An
/// unknown presence still goes through `AccessCamera`.
fn presence_shortcut(present: Option<bool>) -> Option<PermissionState> {
    match present {
        Some(false) => Some(PermissionState::Granted),
        Some(true) | None => None,
    }
}

/// Object path the portal will use for a request with `token`
///
/// The unique name `:1.42` becomes `1_42`.
fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/{}/{}", portal::REQUEST_PATH_PREFIX, sender, token)
}
