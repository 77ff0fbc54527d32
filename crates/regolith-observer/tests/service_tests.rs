//! Integration tests for the visualization service.
//!
//! Each test records the sample cave, spawns the service on an ephemeral
//! localhost port, and talks to it over TCP with the bundled client.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use regolith_core::config::VisualizationConfig;
use regolith_core::runner::{RunOptions, Variant, solve};
use regolith_events::Timeline;
use regolith_observer::{
    ClientError, Reply, Request, StartupError, VisualizationClient, VisualizationHandle,
    spawn_visualization,
};

const SAMPLE: &str = "498,4 -> 498,6 -> 496,6\n503,4 -> 502,4 -> 502,9 -> 494,9\n";

fn local_config() -> VisualizationConfig {
    VisualizationConfig {
        enabled: true,
        address: String::from("127.0.0.1:0"),
        checkpoint_interval: 10,
        retry_delay_ms: 10,
    }
}

fn sample_timeline(variant: Variant) -> Timeline {
    let options = RunOptions {
        verify_invariants: false,
        checkpoint_interval: Some(10),
    };
    solve(SAMPLE, variant, &options).unwrap().timeline.unwrap()
}

async fn spawn(timeline: Timeline) -> VisualizationHandle {
    spawn_visualization(&local_config(), timeline).await.unwrap()
}

#[tokio::test]
async fn get_returns_reconstructed_raster() {
    let timeline = sample_timeline(Variant::Void);
    let expected = timeline.reconstruct(24).unwrap();
    let handle = spawn(timeline).await;

    let mut client = VisualizationClient::connect(handle.local_addr()).await.unwrap();
    let first = client.get(0).await.unwrap();
    assert!(first.starts_with("......+...\n"));
    assert_eq!(client.get(24).await.unwrap(), expected);

    handle.abort();
}

#[tokio::test]
async fn bad_requests_get_error_and_service_keeps_running() {
    let timeline = sample_timeline(Variant::Void);
    let len = timeline.len();
    let handle = spawn(timeline).await;

    let mut client = VisualizationClient::connect(handle.local_addr()).await.unwrap();
    assert!(matches!(client.get(len).await, Err(ClientError::Rejected)));
    assert_eq!(
        client.send_parts(&["GET", "-1"]).await.unwrap(),
        Reply::Error
    );
    assert_eq!(
        client.send_parts(&["GET", "abc"]).await.unwrap(),
        Reply::Error
    );
    assert_eq!(client.send_parts(&["JUMP"]).await.unwrap(), Reply::Error);
    assert_eq!(
        client.send_parts(&["GET 1"]).await.unwrap(),
        Reply::Ok(Some(client.get(1).await.unwrap()))
    );

    assert!(!handle.is_finished());
    handle.abort();
}

#[tokio::test]
async fn stop_replies_ok_and_ends_the_service() {
    let handle = spawn(sample_timeline(Variant::Floored)).await;

    let client = VisualizationClient::connect(handle.local_addr()).await.unwrap();
    client.stop().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn clients_can_reconnect_after_disconnecting() {
    let handle = spawn(sample_timeline(Variant::Void)).await;
    let addr = handle.local_addr();

    let mut first = VisualizationClient::connect(addr).await.unwrap();
    assert!(first.get(0).await.is_ok());
    drop(first);

    let mut second = VisualizationClient::connect(addr).await.unwrap();
    assert_eq!(
        second.request(Request::Get(1)).await.unwrap(),
        Reply::Ok(Some(second.get(1).await.unwrap()))
    );
    second.stop().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn garbage_framing_drops_only_that_connection() {
    use tokio::io::AsyncWriteExt;

    let handle = spawn(sample_timeline(Variant::Void)).await;
    let addr = handle.local_addr();

    let mut raw = tokio::net::TcpStream::connect(addr).await.unwrap();
    raw.write_u32(u32::MAX).await.unwrap();
    drop(raw);

    let mut client = VisualizationClient::connect(addr).await.unwrap();
    assert!(client.get(0).await.is_ok());
    client.stop().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn bind_failure_is_reported_eagerly() {
    let first = spawn(Timeline::default()).await;
    let config = VisualizationConfig {
        address: first.local_addr().to_string(),
        ..local_config()
    };

    let err = spawn_visualization(&config, Timeline::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StartupError::Bind { .. }));
    first.abort();
}
