//! # Backend Registry
//!
//! Selects, at startup, the highest-ranked [`CaptureBackend`] that
//! initializes successfully: `scrap` (GPU-accelerated duplication) first,
//! then the Wayland portal (requires user consent), then the always-available
//! X11 fallback. Mirrors the manager-style backend selection used elsewhere
//! in the pack's screen-capture crates, generalized to this trait.

use crate::capture::backend::CaptureBackend;
use crate::error::{CaptureError, CaptureResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Holds the backend selected at startup and exposes it by name for
/// `get_system_status`.
pub struct BackendRegistry {
    active: Arc<dyn CaptureBackend>,
}

impl BackendRegistry {
    /// Try each backend tier in rank order, keeping the first that
    /// initializes without error.
    pub async fn select() -> CaptureResult<Self> {
        #[cfg(any(target_os = "windows", target_os = "macos"))]
        {
            match crate::capture::scrap_backend::ScrapBackend::try_new() {
                Ok(backend) => {
                    info!(backend = "scrap", "capture backend selected");
                    return Ok(Self {
                        active: Arc::new(backend),
                    });
                }
                Err(e) => warn!(backend = "scrap", error = %e, "backend init failed"),
            }
        }

        #[cfg(all(target_os = "linux", feature = "wayland-pipe"))]
        {
            match crate::capture::wayland_backend::WaylandPortalBackend::try_new().await {
                Ok(backend) => {
                    info!(backend = "wayland-portal", "capture backend selected");
                    return Ok(Self {
                        active: Arc::new(backend),
                    });
                }
                Err(e) => warn!(backend = "wayland-portal", error = %e, "backend init failed"),
            }
        }

        #[cfg(target_os = "linux")]
        {
            match crate::capture::x11_backend::X11Backend::try_new() {
                Ok(backend) => {
                    info!(backend = "x11", "capture backend selected");
                    return Ok(Self {
                        active: Arc::new(backend),
                    });
                }
                Err(e) => warn!(backend = "x11", error = %e, "backend init failed"),
            }
        }

        Err(CaptureError::capture_init(
            "registry",
            "no capture backend initialized successfully",
        ))
    }

    /// Construct a registry around a backend already selected, primarily for
    /// tests that want to force a specific tier.
    pub fn with_backend(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { active: backend }
    }

    pub fn active(&self) -> Arc<dyn CaptureBackend> {
        self.active.clone()
    }

    pub fn active_backend_name(&self) -> &'static str {
        self.active.name()
    }
}
