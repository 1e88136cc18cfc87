//! # Capture Backend Contract
//!
//! Defines the platform-agnostic shape every capture backend implements, plus
//! the data types that flow out of it: [`Display`], [`Window`], and
//! [`RawFrame`].

use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use std::time::Instant;

/// A rectangular region in screen coordinates, used for cropping captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A connected display output, enumerated at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub primary: bool,
}

/// A platform window handle. Handles are only valid as long as the window is
/// still open; callers must treat them as potentially stale between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub handle: u64,
    pub title: String,
    pub pid: u32,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub visible: bool,
    pub minimized: bool,
}

/// Either a display or a window as a capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    Display(u32),
    Window(u64),
}

/// Pixel format of a [`RawFrame`]'s buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgra,
}

/// A single captured frame. Transient: never stored past the encode step.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub monotonic_capture_ns: u128,
}

/// Timing and availability info a backend reports about itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendPerformanceInfo {
    pub last_capture_ms: f64,
    pub hardware_accelerated: bool,
}

/// A concrete screen/window capture implementation for one platform tier.
///
/// Implementations must be disposable: dropping a backend releases any GPU
/// device handles, duplication sessions, or portal connections it holds.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Stable, lowercase identifier used in logs and `get_system_status`.
    fn name(&self) -> &'static str;

    /// Enumerate currently connected displays.
    async fn enumerate_displays(&self) -> CaptureResult<Vec<Display>>;

    /// Enumerate currently open windows. Not every backend supports this.
    async fn enumerate_windows(&self) -> CaptureResult<Vec<Window>> {
        Err(CaptureError::capture_init(
            self.name(),
            "window enumeration not supported by this backend",
        ))
    }

    /// Acquire one frame from `source`, optionally cropped to `region`.
    ///
    /// Returns `CaptureError::FrameCapture` (retryable, transient) when no
    /// frame was ready yet, or `CaptureError::CaptureFatal` when the backend
    /// itself is no longer usable.
    async fn capture(
        &self,
        source: &CaptureSource,
        region: Option<Region>,
    ) -> CaptureResult<RawFrame>;

    /// Timing/availability snapshot for the most recent capture.
    fn performance_info(&self) -> BackendPerformanceInfo;
}

pub(crate) fn crop(frame: &RawFrame, region: Region) -> CaptureResult<RawFrame> {
    let bytes_per_pixel = match frame.format {
        PixelFormat::Rgb => 3usize,
        PixelFormat::Bgra => 4usize,
    };
    let (rx, ry, rw, rh) = (region.x, region.y, region.w, region.h);
    if rx < 0 || ry < 0 || rw == 0 || rh == 0 {
        return Err(CaptureError::validation(
            "region",
            "non-negative origin and positive extent",
            format!("{:?}", region),
        ));
    }
    let (rx, ry) = (rx as u32, ry as u32);
    if rx + rw > frame.width || ry + rh > frame.height {
        return Err(CaptureError::validation(
            "region",
            "must fit within frame bounds",
            format!("{:?} in {}x{}", region, frame.width, frame.height),
        ));
    }
    let stride = frame.width as usize * bytes_per_pixel;
    let row_bytes = rw as usize * bytes_per_pixel;
    let mut out = Vec::with_capacity(row_bytes * rh as usize);
    for row in 0..rh {
        let src_row = (ry + row) as usize;
        let start = src_row * stride + rx as usize * bytes_per_pixel;
        out.extend_from_slice(&frame.data[start..start + row_bytes]);
    }
    Ok(RawFrame {
        data: out,
        width: rw,
        height: rh,
        format: frame.format,
        monotonic_capture_ns: frame.monotonic_capture_ns,
    })
}

pub(crate) fn monotonic_ns(epoch: Instant) -> u128 {
    Instant::now().duration_since(epoch).as_nanos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: u32, h: u32) -> RawFrame {
        let mut data = vec![0u8; (w * h * 4) as usize];
        for (i, px) in data.chunks_mut(4).enumerate() {
            px[0] = (i % 256) as u8;
        }
        RawFrame {
            data,
            width: w,
            height: h,
            format: PixelFormat::Bgra,
            monotonic_capture_ns: 0,
        }
    }

    #[test]
    fn test_crop_within_bounds() {
        let frame = solid_frame(10, 10);
        let cropped = crop(
            &frame,
            Region {
                x: 2,
                y: 2,
                w: 4,
                h: 4,
            },
        )
        .unwrap();
        assert_eq!(cropped.width, 4);
        assert_eq!(cropped.height, 4);
        assert_eq!(cropped.data.len(), 4 * 4 * 4);
    }

    #[test]
    fn test_crop_out_of_bounds_is_invalid_argument() {
        let frame = solid_frame(10, 10);
        let err = crop(
            &frame,
            Region {
                x: 8,
                y: 8,
                w: 10,
                h: 10,
            },
        )
        .unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
