//! Screen streaming integration tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{connected_manager, manager_with, png_frame, MockAgent};
use md_client::{FetchOutcome, Frame, Metrics};
use md_core::{ConnectionState, ImageFormat, TransportError};

#[tokio::test(start_paused = true)]
async fn test_valid_png_frame_decodes() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;

    assert_eq!(manager.fetch_screen().await, FetchOutcome::Decoded);

    let frame = manager.latest_frame();
    assert_eq!(frame.raw, Some(png_frame()));
    assert!(frame.received_at.is_some());
    let surface = frame.decoded.unwrap();
    assert_eq!(surface.format, ImageFormat::Png);
    assert_eq!(surface.dimensions(), (1, 1));
    assert!(!surface.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_payload_without_prefix_keeps_raw_clears_decoded() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    manager.fetch_screen().await;
    assert!(manager.latest_frame().has_image());

    agent.set_screen(Ok("<html>Service Unavailable</html>".to_string()));
    assert_eq!(manager.fetch_screen().await, FetchOutcome::Invalid);

    let frame = manager.latest_frame();
    assert_eq!(frame.raw.as_deref(), Some("<html>Service Unavailable</html>"));
    assert_eq!(frame.decoded, None);
}

#[tokio::test(start_paused = true)]
async fn test_bad_base64_keeps_raw_clears_decoded() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    let body = "data:image/png;base64,!!!not-base64!!!".to_string();
    agent.set_screen(Ok(body.clone()));

    assert_eq!(manager.fetch_screen().await, FetchOutcome::DecodeFailed);

    let frame = manager.latest_frame();
    assert_eq!(frame.raw, Some(body));
    assert_eq!(frame.decoded, None);
}

#[tokio::test(start_paused = true)]
async fn test_truncated_image_is_decode_failure() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    // The 1x1 PNG cut off inside its IDAT chunk
    let body =
        "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQQ==".to_string();
    agent.set_screen(Ok(body.clone()));

    assert_eq!(manager.fetch_screen().await, FetchOutcome::DecodeFailed);

    let frame = manager.latest_frame();
    assert_eq!(frame.raw, Some(body));
    assert_eq!(frame.decoded, None);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_keeps_raw() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    manager.fetch_screen().await;

    agent.set_screen(Err(TransportError::Timeout));
    assert_eq!(manager.fetch_screen().await, FetchOutcome::TransportFailed);

    let frame = manager.latest_frame();
    assert_eq!(frame.raw, Some(png_frame()));
    assert_eq!(frame.decoded, None);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_transport_failures_notify_once() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    let mut rx = manager.frames();
    manager.fetch_screen().await;
    rx.borrow_and_update();

    agent.set_screen(Err(TransportError::Timeout));
    assert_eq!(manager.fetch_screen().await, FetchOutcome::TransportFailed);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().decoded, None);

    assert_eq!(manager.fetch_screen().await, FetchOutcome::TransportFailed);
    assert_eq!(manager.fetch_screen().await, FetchOutcome::TransportFailed);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(manager.latest_frame().raw, Some(png_frame()));
}

#[tokio::test]
async fn test_fetch_skipped_when_not_connected() {
    let agent = Arc::new(MockAgent::new());
    let manager = manager_with(&agent);

    assert_eq!(manager.fetch_screen().await, FetchOutcome::Skipped);
    assert_eq!(MockAgent::calls(&agent.screen_calls), 0);
    assert_eq!(manager.latest_frame().raw, None);
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_noop() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;

    assert!(manager.start_stream());
    assert!(!manager.start_stream());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(manager.is_streaming());
    assert_eq!(manager.stream_stats().active_loops, 1);
    manager.stop_stream();
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_start_runs_one_loop() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;

    manager.start_stream();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(manager.stop_stream());
    assert!(manager.start_stream());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(manager.stream_stats().active_loops, 1);
    manager.stop_stream();
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;

    assert!(!manager.stop_stream());
    manager.start_stream();
    assert!(manager.stop_stream());
    assert!(!manager.stop_stream());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.stream_stats().active_loops, 0);
}

#[tokio::test(start_paused = true)]
async fn test_loop_fetches_every_interval() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;

    manager.start_stream();
    // Ticks at 0, 500, 1000, 1500, 2000 ms
    tokio::time::sleep(Duration::from_millis(2250)).await;
    manager.stop_stream();

    assert_eq!(MockAgent::calls(&agent.screen_calls), 5);
    let stats = manager.stream_stats();
    assert_eq!(stats.ticks, 5);
    assert_eq!(stats.frames_ok, 5);
}

#[tokio::test(start_paused = true)]
async fn test_loop_survives_failures() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    agent.set_screen(Err(TransportError::Connect("refused".to_string())));

    manager.start_stream();
    tokio::time::sleep(Duration::from_millis(1250)).await;
    assert!(manager.is_streaming());

    agent.set_screen(Ok(png_frame()));
    tokio::time::sleep(Duration::from_millis(500)).await;
    manager.stop_stream();

    let stats = manager.stream_stats();
    assert_eq!(stats.frames_failed, 3);
    assert_eq!(stats.frames_ok, 1);
    assert!(manager.latest_frame().has_image());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_stream_and_resets() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    manager.fetch_metrics().await;
    manager.start_stream();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(manager.latest_frame().has_image());

    assert!(manager.disconnect());

    assert!(!manager.is_streaming());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(manager.latest_frame(), Frame::default());
    assert_eq!(manager.latest_metrics(), Metrics::default());
    assert_eq!(manager.pairing_code(), None);
    assert!(manager.endpoint().is_some());

    let calls = MockAgent::calls(&agent.screen_calls);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(MockAgent::calls(&agent.screen_calls), calls);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_when_disconnected_is_noop() {
    let agent = Arc::new(MockAgent::new());
    let manager = manager_with(&agent);
    let mut rx = manager.subscribe_state();

    assert!(!manager.disconnect());
    assert!(!manager.disconnect());
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_fetch_cannot_repopulate_after_disconnect() {
    let agent = Arc::new(MockAgent::new());
    let manager = connected_manager(&agent).await;
    agent.set_screen_delay(Duration::from_secs(1));

    let fetch = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.fetch_screen().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.disconnect();

    assert_eq!(fetch.await.unwrap(), FetchOutcome::Stale);
    assert_eq!(manager.latest_frame().raw, None);
}

#[tokio::test(start_paused = true)]
async fn test_state_reactor_follows_session() {
    let agent = Arc::new(MockAgent::new());
    let manager = manager_with(&agent);
    let reactor = manager.spawn_state_reactor();

    manager.connect(common::HOST, common::CODE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(manager.is_streaming());

    manager.disconnect();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!manager.is_streaming());

    manager.shutdown();
    reactor.await.unwrap();
}
