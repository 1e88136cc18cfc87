//! # Capture Module
//!
//! Platform capture backends and the registry that ranks them at startup.

pub mod backend;
pub mod registry;

#[cfg(any(target_os = "windows", target_os = "macos"))]
pub mod scrap_backend;

#[cfg(target_os = "linux")]
pub mod x11_backend;

#[cfg(all(target_os = "linux", feature = "wayland-pipe"))]
pub mod wayland_backend;

pub use backend::{
    BackendPerformanceInfo, CaptureBackend, CaptureSource, Display, PixelFormat, RawFrame, Region,
    Window,
};
pub use registry::BackendRegistry;
