// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 capture backend
//!
//! Enumerates `/dev/video*` capture nodes, streams a preview-sized MJPG or
//! YUYV feed on a [`FrameLoop`] thread and saves the freshest frame when a
//! photo is requested.

use super::CaptureDevice;
use super::format_converters::{SourceFormat, decode_frame};
use super::frame_loop::{FrameLoop, LatestFrame, LoopAction};
use super::types::{CameraDevice, CameraFrame, CameraKind, PhotoRef};
use crate::constants::{preview, timing};
use crate::errors::{BackendError, BackendResult, CaptureError};
use crate::storage;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Dequeue timeout so the loop notices stop requests on a stalled camera
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(500);

struct ActiveStream {
    path: String,
    frame_loop: FrameLoop,
}

pub struct V4l2Camera {
    output_dir: PathBuf,
    jpeg_quality: u8,
    capture_timeout: Duration,
    stream: Mutex<Option<ActiveStream>>,
    frame: LatestFrame,
}

impl V4l2Camera {
    pub fn new(output_dir: PathBuf, jpeg_quality: u8, capture_timeout: Duration) -> Self {
        Self {
            output_dir,
            jpeg_quality,
            capture_timeout,
            stream: Mutex::new(None),
            frame: LatestFrame::new(),
        }
    }

    /// Streaming state of `device`: `Some(running)` if it is the active one
    fn stream_state(&self, device: &CameraDevice) -> Option<bool> {
        let stream = self.stream.lock().ok()?;
        stream
            .as_ref()
            .filter(|s| s.path == device.path)
            .map(|s| s.frame_loop.is_running())
    }

    /// Wait for a frame captured after `since`
    async fn fresh_frame(
        &self,
        device: &CameraDevice,
        since: Instant,
    ) -> Result<Arc<CameraFrame>, CaptureError> {
        let deadline = since + self.capture_timeout;

        loop {
            match self.stream_state(device) {
                None => return Err(CaptureError::NotActive),
                Some(false) => {
                    return Err(CaptureError::Device("preview stream stopped".to_string()));
                }
                Some(true) => {}
            }

            if let Some(frame) = self.frame.get()
                && frame.captured_at >= since
            {
                return Ok(frame);
            }

            if Instant::now() >= deadline {
                return Err(CaptureError::Timeout);
            }
            tokio::time::sleep(timing::FRAME_POLL_INTERVAL).await;
        }
    }
}

impl CaptureDevice for V4l2Camera {
    fn enumerate(&self) -> Vec<CameraDevice> {
        enumerate_capture_nodes()
    }

    fn activate(&self, device: &CameraDevice) -> BackendResult<()> {
        let mut current = self
            .stream
            .lock()
            .map_err(|_| BackendError::InitializationFailed("stream state poisoned".into()))?;

        if let Some(active) = current.as_ref() {
            if active.path == device.path {
                return Ok(());
            }
            debug!(old = %active.path, new = %device.path, "Replacing active stream");
        }
        // Stop the previous loop before opening the new node
        *current = None;
        self.frame.clear();

        let dev = Device::with_path(&device.path)
            .map_err(|e| open_error(&device.path, e))?;
        let (format, negotiated) = negotiate_format(&device.path, &dev)?;

        info!(
            device = %device.name,
            width = negotiated.width,
            height = negotiated.height,
            format = ?format,
            "Starting V4L2 preview stream"
        );

        let width = negotiated.width;
        let height = negotiated.height;
        let stride = negotiated.stride;
        let slot = self.frame.clone();

        let frame_loop = FrameLoop::start(
            &format!("v4l2:{}", device.path),
            move || {
                let mut stream = Stream::with_buffers(&dev, Type::VideoCapture, preview::BUFFER_COUNT)?;
                stream.set_timeout(DEQUEUE_TIMEOUT);
                Ok(stream)
            },
            move |stream| match CaptureStream::next(stream) {
                Ok((buf, meta)) => {
                    let used = match meta.bytesused as usize {
                        0 => buf.len(),
                        n => n.min(buf.len()),
                    };
                    match decode_frame(format, &buf[..used], width, height, stride) {
                        Ok(frame) => slot.publish(frame),
                        Err(e) => debug!(error = %e, "Dropping undecodable frame"),
                    }
                    LoopAction::Continue
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => LoopAction::Continue,
                Err(e) => {
                    warn!(error = %e, "V4L2 dequeue failed, stopping preview");
                    LoopAction::Stop
                }
            },
        )
        .map_err(|e: io::Error| open_error(&device.path, e))?;

        *current = Some(ActiveStream {
            path: device.path.clone(),
            frame_loop,
        });
        Ok(())
    }

    fn deactivate(&self, device: &CameraDevice) {
        let previous = match self.stream.lock() {
            Ok(mut stream) if stream.as_ref().is_some_and(|s| s.path == device.path) => {
                stream.take()
            }
            _ => None,
        };

        if let Some(mut active) = previous {
            active.frame_loop.stop();
            self.frame.clear();
            info!(device = %device.name, "V4L2 preview stream stopped");
        }
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frame.get()
    }

    async fn take_photo(&self, device: &CameraDevice) -> Result<PhotoRef, CaptureError> {
        info!(device = %device.name, "Capturing photo");
        let frame = self.fresh_frame(device, Instant::now()).await?;
        storage::save_jpeg(frame, self.output_dir.clone(), self.jpeg_quality).await
    }
}

fn open_error(path: &str, err: io::Error) -> BackendError {
    match err.raw_os_error() {
        Some(libc::EBUSY) => BackendError::Busy,
        Some(libc::ENOENT) | Some(libc::ENODEV) => BackendError::DeviceNotFound(path.to_string()),
        _ => BackendError::InitializationFailed(format!("{}: {}", path, err)),
    }
}

/// Pick the first preferred pixel format the driver offers and apply it
/// at preview resolution. The driver may adjust the size.
fn negotiate_format(path: &str, dev: &Device) -> BackendResult<(SourceFormat, Format)> {
    let offered = dev.enum_formats().map_err(|e| open_error(path, e))?;

    let format = SourceFormat::PREFERRED
        .into_iter()
        .find(|f| offered.iter().any(|d| d.fourcc.repr == f.fourcc()))
        .ok_or_else(|| {
            let names: Vec<String> = offered.iter().map(|d| d.fourcc.to_string()).collect();
            BackendError::FormatNotSupported(names.join(", "))
        })?;

    let requested = Format::new(
        preview::WIDTH,
        preview::HEIGHT,
        FourCC::new(&format.fourcc()),
    );
    let applied = dev.set_format(&requested).map_err(|e| open_error(path, e))?;

    match SourceFormat::from_fourcc(&applied.fourcc.repr) {
        Some(actual) => Ok((actual, applied)),
        None => Err(BackendError::FormatNotSupported(applied.fourcc.to_string())),
    }
}

/// List `/dev/video*` nodes that can capture video
fn enumerate_capture_nodes() -> Vec<CameraDevice> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };

    let mut nodes: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("video"))
        .collect();
    nodes.sort_by_key(|name| {
        name.trim_start_matches("video")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut devices = Vec::new();
    for node in nodes {
        let path = format!("/dev/{}", node);
        let Ok(dev) = Device::with_path(&path) else {
            debug!(path = %path, "Cannot open video node");
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }
        // UVC metadata nodes share the capability bits but offer no formats
        if !dev.enum_formats().is_ok_and(|formats| !formats.is_empty()) {
            continue;
        }

        let removable =
            std::fs::read_to_string(format!("/sys/class/video4linux/{}/device/../removable", node))
                .ok();
        let kind = kind_from_hints(&caps.card, removable.as_deref());

        debug!(path = %path, card = %caps.card, driver = %caps.driver, kind = %kind, "Found camera");
        devices.push(CameraDevice {
            name: caps.card.clone(),
            path,
            driver: Some(caps.driver.clone()),
            kind,
        });
    }

    info!(count = devices.len(), "Enumerated V4L2 cameras");
    devices
}

/// Infer facing from the card name and the USB `removable` attribute
fn kind_from_hints(card: &str, removable: Option<&str>) -> CameraKind {
    let card = card.to_ascii_lowercase();
    if ["back", "rear", "world"].iter().any(|k| card.contains(k)) {
        return CameraKind::Back;
    }
    if ["front", "user", "integrated", "built-in"]
        .iter()
        .any(|k| card.contains(k))
    {
        return CameraKind::Front;
    }
    match removable.map(str::trim) {
        Some("fixed") => CameraKind::Front,
        _ => CameraKind::External,
    }
}
