//! `StreamManager` concurrency cap and lifecycle.

use crate::common::{test_context, MockBackend};
use screen_stream_mcp::capture::CaptureSource;
use screen_stream_mcp::core::Mime;
use screen_stream_mcp::session::manager::CreateStreamParams;
use screen_stream_mcp::session::SessionState;
use std::time::Duration;

fn params() -> CreateStreamParams {
    CreateStreamParams {
        source: CaptureSource::Display(0),
        region: None,
        format: Mime::Jpeg,
        fps: 30,
        quality: 80,
        adaptive_quality: false,
        frame_skip: true,
    }
}

#[tokio::test]
async fn create_stream_respects_concurrent_cap() {
    let ctx = test_context(MockBackend::new());

    let first = ctx.manager.create(params()).expect("first stream should be created");
    let second = ctx.manager.create(params()).expect("second stream should be created");
    let third = ctx.manager.create(params());

    assert!(third.is_err(), "cap of 2 concurrent streams must be enforced");
    assert_eq!(third.unwrap_err().category(), "resource");

    first.stop(Duration::from_millis(500)).await.unwrap();
    second.stop(Duration::from_millis(500)).await.unwrap();
}

#[tokio::test]
async fn stopping_a_stream_frees_its_slot() {
    let ctx = test_context(MockBackend::new());

    let first = ctx.manager.create(params()).unwrap();
    first.stop(Duration::from_millis(500)).await.unwrap();
    assert_eq!(first.state(), SessionState::Stopped);

    // A slot is free once the first session is stopped, even before the
    // periodic reaper has removed it from the registry.
    let second = ctx.manager.create(params());
    assert!(second.is_ok());
}

#[tokio::test]
async fn reap_stopped_removes_terminal_sessions_from_the_registry() {
    let ctx = test_context(MockBackend::new());

    let session = ctx.manager.create(params()).unwrap();
    let id = session.id();
    session.stop(Duration::from_millis(500)).await.unwrap();

    assert_eq!(ctx.manager.reap_stopped(), 1);
    assert!(ctx.manager.get(id).is_err());
}

#[tokio::test]
async fn stream_produces_frames_into_the_resource_cache() {
    let backend = MockBackend::new();
    let ctx = test_context(backend.clone());

    let session = ctx.manager.create(params()).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.stop(Duration::from_millis(500)).await.unwrap();

    assert!(backend.call_count() > 0, "producer loop should have captured at least one frame");
    assert!(!ctx.cache.is_empty(), "captured frames should land in the resource cache");
}
