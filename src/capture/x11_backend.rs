//! # X11 Capture Backend
//!
//! Direct `x11rb` `GetImage` capture. Always available on an X11 session and
//! requires no compositor cooperation, so it is the lowest-ranked, always-on
//! fallback tier: no hardware acceleration, no user-consent dialog.

use crate::capture::backend::{
    BackendPerformanceInfo, CaptureBackend, CaptureSource, Display, PixelFormat, RawFrame, Region,
};
use crate::error::{CaptureError, CaptureResult};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Instant;
use tokio::task::spawn_blocking;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, ImageFormat};

/// Capture backend built directly on the X11 protocol via `x11rb`.
pub struct X11Backend {
    epoch: Instant,
    last_capture_ms: Mutex<f64>,
}

impl X11Backend {
    /// Probe that an X11 display is reachable.
    pub fn try_new() -> CaptureResult<Self> {
        x11rb::connect(None).map_err(|e| CaptureError::capture_init("x11", e.to_string()))?;
        Ok(Self {
            epoch: Instant::now(),
            last_capture_ms: Mutex::new(0.0),
        })
    }
}

#[async_trait]
impl CaptureBackend for X11Backend {
    fn name(&self) -> &'static str {
        "x11"
    }

    async fn enumerate_displays(&self) -> CaptureResult<Vec<Display>> {
        spawn_blocking(|| {
            let (conn, screen_num) =
                x11rb::connect(None).map_err(|e| CaptureError::platform("x11", None, e.to_string()))?;
            let screen = &conn.setup().roots[screen_num];
            Ok(vec![Display {
                id: 0,
                x: 0,
                y: 0,
                w: screen.width_in_pixels as u32,
                h: screen.height_in_pixels as u32,
                primary: true,
            }])
        })
        .await
        .map_err(|e| CaptureError::external("tokio::task", e))?
    }

    async fn capture(
        &self,
        source: &CaptureSource,
        region: Option<Region>,
    ) -> CaptureResult<RawFrame> {
        let display_id = match source {
            CaptureSource::Display(id) => *id,
            CaptureSource::Window(_) => {
                return Err(CaptureError::capture_init(
                    "x11",
                    "window capture not supported by the x11 fallback backend",
                ));
            }
        };
        let t0 = Instant::now();
        let monotonic_capture_ns = crate::capture::backend::monotonic_ns(self.epoch);
        let region = region;
        let frame = spawn_blocking(move || capture_root_window(display_id, region))
            .await
            .map_err(|e| CaptureError::external("tokio::task", e))??;
        *self.last_capture_ms.lock().unwrap() = t0.elapsed().as_secs_f64() * 1000.0;
        Ok(RawFrame {
            monotonic_capture_ns,
            ..frame
        })
    }

    fn performance_info(&self) -> BackendPerformanceInfo {
        BackendPerformanceInfo {
            last_capture_ms: *self.last_capture_ms.lock().unwrap(),
            hardware_accelerated: false,
        }
    }
}

fn capture_root_window(display_id: u32, region: Option<Region>) -> CaptureResult<RawFrame> {
    let (conn, screen_num) =
        x11rb::connect(None).map_err(|e| CaptureError::platform("x11", None, e.to_string()))?;
    if display_id != 0 {
        return Err(CaptureError::validation(
            "display_id",
            "x11 fallback only exposes display 0",
            display_id.to_string(),
        ));
    }
    let screen = &conn.setup().roots[screen_num];
    let root = screen.root;

    let (x, y, w, h) = match region {
        Some(r) => (r.x as i16, r.y as i16, r.w as u16, r.h as u16),
        None => (0, 0, screen.width_in_pixels, screen.height_in_pixels),
    };

    let image = conn
        .get_image(ImageFormat::Z_PIXMAP, root, x, y, w, h, !0)
        .map_err(|e| CaptureError::capture_fatal("x11", e.to_string()))?
        .reply()
        .map_err(|e| CaptureError::capture_fatal("x11", e.to_string()))?;

    Ok(RawFrame {
        data: image.data,
        width: w as u32,
        height: h as u32,
        format: PixelFormat::Bgra,
        monotonic_capture_ns: 0,
    })
}
