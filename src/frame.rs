use crate::error::FrameError;
use crate::geometry::ScanRect;
use crate::orientation::Rotation;
use crate::preview_size::PreviewSize;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Byte layout of a preview buffer. Every variant starts with a full
/// resolution 8-bit luminance plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Y plane followed by interleaved VU at quarter resolution
    #[default]
    Nv21,
    /// Y plane followed by separate V and U planes
    Yv12,
    /// Luminance only
    Gray8,
}

impl FrameFormat {
    /// Total buffer size for the given dimensions
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        let luma = luma_size(width, height);
        match self {
            FrameFormat::Nv21 | FrameFormat::Yv12 => luma + luma / 2,
            FrameFormat::Gray8 => luma,
        }
    }
}

fn luma_size(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// One raw preview buffer as delivered by the camera
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// Unique frame identifier
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

impl PreviewFrame {
    pub fn new(id: u64, data: Vec<u8>, width: u32, height: u32, format: FrameFormat) -> Self {
        Self {
            id,
            timestamp: SystemTime::now(),
            data,
            width,
            height,
            format,
        }
    }

    pub fn size(&self) -> PreviewSize {
        PreviewSize::new(self.width, self.height)
    }

    /// The leading luminance plane
    pub fn luminance(&self) -> Result<&[u8], FrameError> {
        let expected = luma_size(self.width, self.height);
        self.data
            .get(..expected)
            .ok_or(FrameError::BufferTooSmall {
                expected,
                actual: self.data.len(),
            })
    }
}

/// Rotate a `width`x`height` luminance plane clockwise into `out`.
///
/// Every destination pixel is pulled from the source through the inverse
/// rotation about the buffer centre. Coordinates are doubled so the centre
/// of even-sized buffers stays on the integer grid. Returns the dimensions
/// of the rotated plane; quarter turns swap them.
pub fn rotate_luminance(
    src: &[u8],
    width: u32,
    height: u32,
    rotation: Rotation,
    out: &mut Vec<u8>,
) -> Result<(u32, u32), FrameError> {
    let len = luma_size(width, height);
    if src.len() < len {
        return Err(FrameError::BufferTooSmall {
            expected: len,
            actual: src.len(),
        });
    }

    let (dst_width, dst_height) = if rotation.swaps_axes() {
        (height, width)
    } else {
        (width, height)
    };

    out.clear();
    if rotation == Rotation::Rotate0 {
        out.extend_from_slice(&src[..len]);
        return Ok((width, height));
    }
    out.resize(len, 0);

    let (cos, sin) = rotation.cos_sin();
    let (w, h) = (width as i64, height as i64);
    let (dw, dh) = (dst_width as i64, dst_height as i64);

    for y in 0..dh {
        let v = 2 * y - (dh - 1);
        let row = (y * dw) as usize;
        for x in 0..dw {
            let u = 2 * x - (dw - 1);
            let sx = (u * cos + v * sin + (w - 1)) / 2;
            let sy = (v * cos - u * sin + (h - 1)) / 2;
            out[row + x as usize] = src[(sy * w + sx) as usize];
        }
    }

    Ok((dst_width, dst_height))
}

/// A region of interest over a luminance plane, borrowed without copying
#[derive(Debug, Clone, Copy)]
pub struct LuminanceSource<'a> {
    data: &'a [u8],
    data_width: u32,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl<'a> LuminanceSource<'a> {
    pub fn new(
        data: &'a [u8],
        data_width: u32,
        data_height: u32,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        let expected = luma_size(data_width, data_height);
        if data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        let fits = width > 0
            && height > 0
            && left as u64 + width as u64 <= data_width as u64
            && top as u64 + height as u64 <= data_height as u64;
        if !fits {
            return Err(FrameError::CropOutOfBounds {
                left,
                top,
                width,
                height,
                data_width,
                data_height,
            });
        }

        Ok(Self {
            data,
            data_width,
            left,
            top,
            width,
            height,
        })
    }

    /// Crop to a preview-space rectangle, truncating its bounds to whole pixels
    pub fn from_rect(
        data: &'a [u8],
        data_width: u32,
        data_height: u32,
        rect: &ScanRect,
    ) -> Result<Self, FrameError> {
        let left = rect.left.max(0.0) as u32;
        let top = rect.top.max(0.0) as u32;
        let width = rect.width().max(0.0) as u32;
        let height = rect.height().max(0.0) as u32;
        Self::new(data, data_width, data_height, left, top, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Crop origin within the full buffer
    pub fn offset(&self) -> (u32, u32) {
        (self.left, self.top)
    }

    /// One row of the cropped region
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = (self.top + y) as usize * self.data_width as usize + self.left as usize;
        &self.data[start..start + self.width as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.row(y)[x as usize]
    }

    /// Copy the region into a contiguous buffer
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }
}
