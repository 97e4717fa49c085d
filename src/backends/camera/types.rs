// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Which way a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    /// World-facing (rear) camera
    #[serde(alias = "rear")]
    Back,
    /// User-facing camera, including built-in laptop webcams
    Front,
    /// Pluggable camera (USB, capture card)
    External,
}

impl std::fmt::Display for CameraKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraKind::Back => write!(f, "back"),
            CameraKind::Front => write!(f, "front"),
            CameraKind::External => write!(f, "external"),
        }
    }
}

impl std::str::FromStr for CameraKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "back" | "rear" => Ok(CameraKind::Back),
            "front" => Ok(CameraKind::Front),
            "external" => Ok(CameraKind::External),
            other => Err(format!("unknown camera kind '{}'", other)),
        }
    }
}

/// Represents a camera device
///
/// This is the handle the controller borrows while the live view is open.
/// It is only a description: opening the device is the backend's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraDevice {
    /// Human readable name (V4L2 card)
    pub name: String,
    /// Path to the capture node (e.g. /dev/video0) or source file
    pub path: String,
    /// Driver name, when known
    pub driver: Option<String>,
    /// Facing direction
    pub kind: CameraKind,
}

impl CameraDevice {
    /// Pick the device matching `kind`, or the first one when `kind` is `None`
    pub fn select(devices: &[CameraDevice], kind: Option<CameraKind>) -> Option<CameraDevice> {
        match kind {
            Some(kind) => devices.iter().find(|d| d.kind == kind).cloned(),
            None => devices.first().cloned(),
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.path, self.kind)
    }
}

/// A single decoded frame, packed RGB24 without row padding
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from packed RGB bytes
    ///
    /// Returns `None` if the buffer does not hold exactly `width * height` pixels.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        })
    }

    /// RGB value at (x, y), clamped to the frame bounds
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = (y * self.width as usize + x) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

/// Reference to a captured photo on disk
///
/// The file belongs to the filesystem; this is only the address, valid for
/// the current run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoRef(PathBuf);

impl PhotoRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// `file://` URI for the photo
    pub fn uri(&self) -> String {
        format!("file://{}", self.0.display())
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
