//! A slow subscriber must never stall the producer loop.

use crate::common::{test_context, MockBackend};
use screen_stream_mcp::capture::CaptureSource;
use screen_stream_mcp::core::Mime;
use screen_stream_mcp::session::manager::CreateStreamParams;
use tokio::sync::mpsc;
use std::time::Duration;

#[tokio::test]
async fn slow_subscriber_does_not_block_frame_production() {
    let backend = MockBackend::new();
    let ctx = test_context(backend.clone());

    let session = ctx
        .manager
        .create(CreateStreamParams {
            source: CaptureSource::Display(0),
            region: None,
            format: Mime::Jpeg,
            fps: 60,
            quality: 60,
            adaptive_quality: false,
            frame_skip: true,
        })
        .unwrap();

    // A queue of depth 1 that is never drained: after the first event it
    // stays permanently full.
    let (tx, _rx) = mpsc::channel(1);
    session.subscribe(tx);

    tokio::time::sleep(Duration::from_millis(200)).await;
    session.stop(Duration::from_millis(500)).await.unwrap();

    // The producer kept running and capturing frames well past the
    // subscriber's one-slot capacity instead of blocking on it.
    assert!(
        backend.call_count() > 2,
        "producer should not stall behind a saturated subscriber queue, got {} captures",
        backend.call_count()
    );

    // The saturated subscriber is dropped, not left stalling future
    // broadcasts (spec: overflow drops the slowest subscriber).
    assert_eq!(
        session.subscriber_count(),
        0,
        "a subscriber whose queue overflowed must be removed"
    );
}

#[tokio::test]
async fn dropped_receiver_is_pruned_from_the_subscriber_list() {
    let backend = MockBackend::new();
    let ctx = test_context(backend.clone());

    let session = ctx
        .manager
        .create(CreateStreamParams {
            source: CaptureSource::Display(0),
            region: None,
            format: Mime::Jpeg,
            fps: 30,
            quality: 60,
            adaptive_quality: false,
            frame_skip: true,
        })
        .unwrap();

    let (tx, rx) = mpsc::channel(4);
    session.subscribe(tx);
    drop(rx);

    // The next broadcast after the receiver is dropped should prune the
    // subscriber without erroring or panicking.
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.stop(Duration::from_millis(500)).await.unwrap();
}
