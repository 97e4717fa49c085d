// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for preview frames
//!
//! Every backend hands out packed RGB24, so the terminal renderer and the
//! JPEG encoder only ever deal with one layout.

use super::types::CameraFrame;

/// Driver pixel formats we know how to turn into RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Motion JPEG, one complete JPEG per buffer
    Mjpeg,
    /// Packed YUV 4:2:2, Y0 U Y1 V
    Yuyv,
}

impl SourceFormat {
    /// Preference order when negotiating with a driver
    pub const PREFERRED: [SourceFormat; 2] = [SourceFormat::Mjpeg, SourceFormat::Yuyv];

    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            SourceFormat::Mjpeg => *b"MJPG",
            SourceFormat::Yuyv => *b"YUYV",
        }
    }

    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"MJPG" | b"JPEG" => Some(SourceFormat::Mjpeg),
            b"YUYV" => Some(SourceFormat::Yuyv),
            _ => None,
        }
    }
}

/// Decode one driver buffer into a frame
pub fn decode_frame(
    format: SourceFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> Result<CameraFrame, String> {
    match format {
        SourceFormat::Mjpeg => {
            let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
                .map_err(|e| format!("MJPEG decode failed: {}", e))?
                .to_rgb8();
            let (w, h) = image.dimensions();
            CameraFrame::from_rgb(w, h, image.into_raw())
                .ok_or_else(|| "decoded MJPEG frame is empty".to_string())
        }
        SourceFormat::Yuyv => {
            let rgb = yuyv_to_rgb(data, width, height, stride);
            CameraFrame::from_rgb(width, height, rgb)
                .ok_or_else(|| format!("empty YUYV frame ({}x{})", width, height))
        }
    }
}

/// Convert YUYV (YUV 4:2:2) to packed RGB24
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels. Rows are
/// `stride` bytes apart. Pixels past the end of a short buffer are black.
pub fn yuyv_to_rgb(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let stride = (stride as usize).max(w * 2);
    let mut rgb = vec![0u8; w * h * 3];

    for row in 0..h {
        let line_start = row * stride;
        let Some(line) = data.get(line_start..(line_start + w * 2).min(data.len())) else {
            break;
        };

        for (pair, chunk) in line.chunks_exact(4).enumerate() {
            let u = chunk[1];
            let v = chunk[3];
            for (i, luma) in [chunk[0], chunk[2]].into_iter().enumerate() {
                let x = pair * 2 + i;
                if x >= w {
                    break;
                }
                let (r, g, b) = yuv_to_rgb(luma, u, v);
                let idx = (row * w + x) * 3;
                rgb[idx] = r;
                rgb[idx + 1] = g;
                rgb[idx + 2] = b;
            }
        }
    }

    rgb
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
