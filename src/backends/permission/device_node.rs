// SPDX-License-Identifier: GPL-3.0-only

//! Device node permission check
//!
//! Outside a sandbox nobody prompts for camera access: the process can use a
//! camera iff it can open `/dev/videoN` read-write, which usually means
//! membership in the `video` group or a logind ACL.

use super::{PermissionProvider, PermissionState};
use crate::errors::{PermissionError, PermissionResult};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DeviceNodePermission {
    dev_dir: PathBuf,
}

impl DeviceNodePermission {
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Scan `dev_dir` instead of `/dev`
    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }

    /// Scan the device directory on the blocking pool
    async fn check(&self) -> PermissionResult<PermissionState> {
        let dev_dir = self.dev_dir.clone();
        tokio::task::spawn_blocking(move || scan(&dev_dir))
            .await
            .map_err(|e| PermissionError::DeviceScan(format!("scan task failed: {}", e)))?
    }
}

impl Default for DeviceNodePermission {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionProvider for DeviceNodePermission {
    async fn query_status(&self) -> PermissionResult<PermissionState> {
        self.check().await
    }

    async fn request_access(&self) -> PermissionResult<PermissionState> {
        // There is no dialog to show; re-check in case the user fixed it
        let state = self.check().await?;
        if state.is_granted() {
            info!("Camera device nodes are accessible");
        } else {
            warn!(
                "Camera device nodes are not accessible; add the user to the 'video' group \
                 or log in on a local seat"
            );
        }
        Ok(state)
    }
}

fn scan(dev_dir: &Path) -> PermissionResult<PermissionState> {
    let entries = std::fs::read_dir(dev_dir)
        .map_err(|e| PermissionError::DeviceScan(format!("{}: {}", dev_dir.display(), e)))?;

    let nodes: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("video"))
        .map(|e| e.path())
        .collect();

    // No nodes at all is a missing device, not a refusal
    if nodes.is_empty() {
        debug!(dir = %dev_dir.display(), "No video nodes present");
        return Ok(PermissionState::Granted);
    }

    let accessible = nodes.iter().filter(|p| is_read_write(p)).count();
    debug!(total = nodes.len(), accessible, "Checked video node access");
    Ok(PermissionState::from(accessible > 0))
}

fn is_read_write(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the call's duration
    unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_nodes_is_granted() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DeviceNodePermission::with_dev_dir(dir.path());
        assert_eq!(provider.query_status().await, Ok(PermissionState::Granted));
    }

    #[tokio::test]
    async fn test_accessible_node_is_granted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("video0"), b"").unwrap();
        let provider = DeviceNodePermission::with_dev_dir(dir.path());
        assert_eq!(provider.request_access().await, Ok(PermissionState::Granted));
    }

    #[test]
    fn test_scan_ignores_other_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("null"), b"").unwrap();
        std::fs::write(dir.path().join("media0"), b"").unwrap();
        assert_eq!(scan(dir.path()), Ok(PermissionState::Granted));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_query_on_current_thread_runtime() {
        // Same runtime shape as the terminal UI
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("video0"), b"").unwrap();
        let provider = DeviceNodePermission::with_dev_dir(dir.path());

        let (query, request) = tokio::join!(provider.query_status(), provider.request_access());
        assert_eq!(query, Ok(PermissionState::Granted));
        assert_eq!(request, Ok(PermissionState::Granted));
    }

    #[tokio::test]
    async fn test_missing_dir_is_error() {
        let provider = DeviceNodePermission::with_dev_dir("/nonexistent/dev");
        assert!(matches!(
            provider.query_status().await,
            Err(PermissionError::DeviceScan(_))
        ));
    }
}
