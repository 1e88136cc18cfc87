//! # Core Infrastructure Module
//!
//! The bounded, content-addressed resource cache that decouples frame
//! producers (stream sessions) from frame readers (resource reads over any
//! transport).

pub mod resource_cache;

pub use resource_cache::{CacheEntry, EncodedFrame, FrameMetadata, Mime, ResourceCache};
