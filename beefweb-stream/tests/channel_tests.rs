//! Integration tests for the subscription channel against a local SSE server


use std::time::Duration;

use beefweb_api::Credentials;
use beefweb_stream::{
    decode_message, ChannelEvent, ChannelState, StreamError, SubscriptionChannel, SubscriptionConfig,
    SubscriptionEndpoint, UpdateClass, MIN_RECONNECT_INTERVAL,
};
use test_helpers::SseMockServer;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn channel_for(server: &SseMockServer, credentials: Option<Credentials>) -> SubscriptionChannel {
    let endpoint = SubscriptionEndpoint::new(&server.address(), &SubscriptionConfig::default(), credentials).unwrap();
    SubscriptionChannel::new(endpoint).unwrap()
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("channel closed")
}

#[tokio::test]
async fn test_messages_are_forwarded() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    assert!(channel.connect(Duration::from_millis(50), tx));
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));
    assert!(channel.is_connected());

    server.send(r#"{"playlists": []}"#);
    match next_event(&mut rx).await {
        ChannelEvent::Message(raw) => {
            let fragments = decode_message(&raw).unwrap();
            assert_eq!(fragments[0].class, UpdateClass::Playlists);
        }
        other => panic!("expected message, got {other:?}"),
    }

    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(!channel.is_connected());
}

#[tokio::test]
async fn test_connect_is_noop_when_open() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(50), tx.clone());
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));

    assert!(!channel.connect(Duration::from_millis(50), tx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.connection_count(), 1);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(20), tx);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));

    server.close_all();
    match next_event(&mut rx).await {
        ChannelEvent::ConnectionLost(StreamError::TransportFailure(_)) => {}
        other => panic!("expected ConnectionLost, got {other:?}"),
    }

    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));
    assert_eq!(server.connection_count(), 2);
    assert!(channel.is_connected());

    server.send(r#"{"player": {}}"#);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Message(_)));

    channel.disconnect().await;
}

#[tokio::test]
async fn test_request_carries_query_and_credentials() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, Some(Credentials::new("user", "pass")));
    let (tx, mut rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(50), tx);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));

    let requests = server.received_requests().await;
    let request = &requests[0];
    assert!(request.starts_with("GET /api/query/updates?player=true&trcolumns="));
    assert!(request.contains("Accept: text/event-stream"));
    assert!(request.contains("Authorization: Basic dXNlcjpwYXNz"));

    channel.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_then_reconnect() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);

    let (tx, mut rx) = mpsc::unbounded_channel();
    channel.connect(Duration::from_millis(50), tx);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));
    channel.disconnect().await;
    assert!(!channel.is_connected());

    let (tx, mut rx) = mpsc::unbounded_channel();
    assert!(channel.connect(Duration::from_millis(50), tx));
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));
    assert_eq!(server.connection_count(), 2);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_state_watch_sees_open() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let mut state = channel.watch_state();
    let (tx, _rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(50), tx);
    timeout(WAIT, state.wait_for(|s| *s == ChannelState::Open))
        .await
        .expect("timed out waiting for open")
        .unwrap();

    channel.disconnect().await;
    assert_eq!(*state.borrow(), ChannelState::Disconnected);
}

#[tokio::test]
async fn test_corrupt_event_is_dropped_and_stream_survives() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(50), tx);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));

    server.send_raw(b"data: {\"x\":\"\xff\"}\n\n");
    server.send(r#"{"playlists": []}"#);

    match next_event(&mut rx).await {
        ChannelEvent::Message(raw) => assert_eq!(raw, r#"{"playlists": []}"#),
        other => panic!("expected the valid message, got {other:?}"),
    }
    assert!(channel.is_connected());
    assert_eq!(server.connection_count(), 1);

    channel.disconnect().await;
}

#[tokio::test]
async fn test_zero_retry_hint_keeps_a_pause() {
    let server = SseMockServer::start().await;
    let mut channel = channel_for(&server, None);
    let (tx, mut rx) = mpsc::unbounded_channel();

    channel.connect(Duration::from_millis(50), tx);
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));

    server.send_raw(b"retry: 0\n\n");
    tokio::time::sleep(Duration::from_millis(20)).await;
    server.close_all();
    assert!(matches!(next_event(&mut rx).await, ChannelEvent::ConnectionLost(_)));

    let early = timeout(MIN_RECONNECT_INTERVAL / 2, rx.recv()).await;
    assert!(early.is_err(), "reconnected without pausing");

    assert!(matches!(next_event(&mut rx).await, ChannelEvent::Opened));
    channel.disconnect().await;
}
