//! End-to-end tests driving a transport exactly as a real client would,
//! with no network dependency.

#[path = "common/mod.rs"]
mod common;

#[path = "e2e/stdio.rs"]
mod stdio;
