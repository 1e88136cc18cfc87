//! # Scrap-backed Capture Backend
//!
//! Wraps the `scrap` crate's platform capturer (DirectShow/GDI on Windows,
//! AVFoundation on macOS) as the highest-ranked [`CaptureBackend`]. Stands in
//! for GPU-accelerated desktop duplication.
//!
//! `scrap::Capturer::frame()` is synchronous and may return `WouldBlock` when
//! the compositor hasn't produced a new frame yet; that condition is surfaced
//! as a retryable `CaptureError::FrameCapture`, matching the producer loop's
//! retry-once-then-drop contract.

use crate::capture::backend::{
    BackendPerformanceInfo, CaptureBackend, CaptureSource, Display, PixelFormat, RawFrame, Region,
    Window,
};
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Instant;
use tokio::task::spawn_blocking;

/// Capture backend built on `scrap::{Display, Capturer, Window}`.
pub struct ScrapBackend {
    epoch: Instant,
    last_capture_ms: Mutex<f64>,
}

impl ScrapBackend {
    /// Probe that a primary display is reachable; used during backend
    /// selection to decide whether this tier initializes successfully.
    pub fn try_new() -> CaptureResult<Self> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            scrap::Display::primary()
                .map_err(|e| CaptureError::capture_init("scrap", e.to_string()))?;
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            return Err(CaptureError::capture_init(
                "scrap",
                "scrap backend is only available on windows and macos",
            ));
        }
        Ok(Self {
            epoch: Instant::now(),
            last_capture_ms: Mutex::new(0.0),
        })
    }
}

#[async_trait]
impl CaptureBackend for ScrapBackend {
    fn name(&self) -> &'static str {
        "scrap"
    }

    async fn enumerate_displays(&self) -> CaptureResult<Vec<Display>> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            spawn_blocking(|| {
                let displays = scrap::Display::all()
                    .map_err(|e| CaptureError::platform("scrap", None, e.to_string()))?;
                Ok(displays
                    .iter()
                    .enumerate()
                    .map(|(i, d)| Display {
                        id: i as u32,
                        x: 0,
                        y: 0,
                        w: d.width() as u32,
                        h: d.height() as u32,
                        primary: i == 0,
                    })
                    .collect())
            })
            .await
            .map_err(|e| CaptureError::external("tokio::task", e))?
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Err(CaptureError::capture_init("scrap", "unsupported platform"))
        }
    }

    async fn enumerate_windows(&self) -> CaptureResult<Vec<Window>> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            spawn_blocking(|| {
                let windows = scrap::Window::all()
                    .map_err(|e| CaptureError::platform("scrap", None, e.to_string()))?;
                Ok(windows
                    .iter()
                    .enumerate()
                    .map(|(i, w)| Window {
                        handle: i as u64,
                        title: w.title().to_string(),
                        pid: 0,
                        x: 0,
                        y: 0,
                        w: w.width() as u32,
                        h: w.height() as u32,
                        visible: true,
                        minimized: false,
                    })
                    .collect())
            })
            .await
            .map_err(|e| CaptureError::external("tokio::task", e))?
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Err(CaptureError::capture_init("scrap", "unsupported platform"))
        }
    }

    async fn capture(
        &self,
        source: &CaptureSource,
        region: Option<Region>,
    ) -> CaptureResult<RawFrame> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            let source = source.clone();
            let t0 = Instant::now();
            let monotonic_capture_ns = crate::capture::backend::monotonic_ns(self.epoch);
            let frame = spawn_blocking(move || capture_once(&source))
                .await
                .map_err(|e| CaptureError::external("tokio::task", e))??;
            *self.last_capture_ms.lock().unwrap() = t0.elapsed().as_secs_f64() * 1000.0;
            let frame = RawFrame {
                monotonic_capture_ns,
                ..frame
            };
            match region {
                Some(r) => crate::capture::backend::crop(&frame, r),
                None => Ok(frame),
            }
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let _ = (source, region);
            Err(CaptureError::capture_fatal("scrap", "unsupported platform"))
        }
    }

    fn performance_info(&self) -> BackendPerformanceInfo {
        BackendPerformanceInfo {
            last_capture_ms: *self.last_capture_ms.lock().unwrap(),
            hardware_accelerated: true,
        }
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn capture_once(source: &CaptureSource) -> CaptureResult<RawFrame> {
    use std::{thread, time::Duration};

    let (w, h, mut capturer) = match source {
        CaptureSource::Display(id) => {
            let displays = scrap::Display::all()
                .map_err(|e| CaptureError::platform("scrap", None, e.to_string()))?;
            let display = displays
                .into_iter()
                .nth(*id as usize)
                .ok_or_else(|| CaptureError::validation("display_id", "must exist", id.to_string()))?;
            let (w, h) = (display.width(), display.height());
            let capturer = scrap::Capturer::new(display)
                .map_err(|e| CaptureError::capture_init("scrap", e.to_string()))?;
            (w, h, capturer)
        }
        CaptureSource::Window(handle) => {
            let windows = scrap::Window::all()
                .map_err(|e| CaptureError::platform("scrap", None, e.to_string()))?;
            let window = windows
                .into_iter()
                .nth(*handle as usize)
                .ok_or_else(|| CaptureError::validation("window", "must exist", handle.to_string()))?;
            let (w, h) = (window.width(), window.height());
            let capturer = scrap::Capturer::new(window)
                .map_err(|e| CaptureError::capture_init("scrap", e.to_string()))?;
            (w, h, capturer)
        }
    };

    for attempt in 0..3 {
        match capturer.frame() {
            Ok(frame) => {
                return Ok(RawFrame {
                    data: frame.to_vec(),
                    width: w as u32,
                    height: h as u32,
                    format: PixelFormat::Bgra,
                    monotonic_capture_ns: 0,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if attempt == 2 {
                    return Err(CaptureError::frame_capture("no frame ready yet"));
                }
                thread::sleep(Duration::from_millis(2));
            }
            Err(e) => return Err(CaptureError::capture_fatal("scrap", e.to_string())),
        }
    }
    unreachable!()
}
