// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission providers
//!
//! On a regular desktop session camera access is plain Unix permissions on
//! the device nodes. Inside a Flatpak sandbox the XDG desktop portal decides
//! and may show a dialog.

pub mod device_node;
pub mod portal;

pub use device_node::DeviceNodePermission;
pub use portal::PortalPermission;

use crate::config::PermissionBackendType;
use crate::errors::PermissionResult;
use serde::Serialize;
use std::future::Future;

/// Whether the process may use the camera
///
/// "Not asked yet" and "refused" both map to `Denied`: either way the live
/// view is blocked until an explicit grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionState {
    #[default]
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

impl From<bool> for PermissionState {
    fn from(granted: bool) -> Self {
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Granted => write!(f, "granted"),
        }
    }
}

/// OS-level gatekeeper for camera access
pub trait PermissionProvider: Send + Sync + 'static {
    /// Current status, without prompting the user
    fn query_status(&self) -> impl Future<Output = PermissionResult<PermissionState>> + Send;

    /// Ask for access; may show a system dialog
    fn request_access(&self) -> impl Future<Output = PermissionResult<PermissionState>> + Send;
}

/// Provider chosen from configuration
pub enum SystemPermission {
    Portal(PortalPermission),
    DeviceNode(DeviceNodePermission),
}

impl SystemPermission {
    pub fn from_backend(backend: PermissionBackendType) -> Self {
        match backend {
            PermissionBackendType::Portal => SystemPermission::Portal(PortalPermission::new()),
            PermissionBackendType::DeviceNode => {
                SystemPermission::DeviceNode(DeviceNodePermission::new())
            }
            PermissionBackendType::Auto if portal::is_sandboxed() => {
                SystemPermission::Portal(PortalPermission::new())
            }
            PermissionBackendType::Auto => SystemPermission::DeviceNode(DeviceNodePermission::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SystemPermission::Portal(_) => "portal",
            SystemPermission::DeviceNode(_) => "device-node",
        }
    }
}

impl PermissionProvider for SystemPermission {
    async fn query_status(&self) -> PermissionResult<PermissionState> {
        match self {
            SystemPermission::Portal(p) => p.query_status().await,
            SystemPermission::DeviceNode(p) => p.query_status().await,
        }
    }

    async fn request_access(&self) -> PermissionResult<PermissionState> {
        match self {
            SystemPermission::Portal(p) => p.request_access().await,
            SystemPermission::DeviceNode(p) => p.request_access().await,
        }
    }
}
