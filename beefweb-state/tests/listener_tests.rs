//! End-to-end listener tests against a local SSE server

mod test_helpers;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use beefweb_api::{PlaybackState, PlayerSnapshot, PlaylistItemsSnapshot};
use beefweb_state::{ChannelState, EventListener, ListenerConfig, UpdateClass};
use serde_json::json;
use test_helpers::SseMockServer;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn player_message(index: i64, state: &str) -> String {
    json!({
        "player": {
            "info": {"name": "foobar2000", "title": "foobar2000", "version": "1.6.16", "pluginVersion": "0.8"},
            "activeItem": {
                "playlistId": "p1", "playlistIndex": 0, "index": index,
                "position": 3.0, "duration": 180.0, "columns": []
            },
            "volume": {"type": "db", "min": -100.0, "max": 0.0, "value": -3.0, "isMuted": false},
            "playbackState": state,
            "playbackModes": ["Default", "Repeat (playlist)"],
            "playbackMode": 0
        }
    })
    .to_string()
}

fn playlists_message() -> String {
    json!({
        "playlists": [
            {"id": "p1", "index": 0, "title": "Default", "isCurrent": true, "itemCount": 3, "totalTime": 540.0}
        ]
    })
    .to_string()
}

fn listener_for(server: &SseMockServer, config: ListenerConfig) -> EventListener {
    let config = ListenerConfig {
        base_address: "127.0.0.1".to_string(),
        port: server.port(),
        ..config
    };
    EventListener::new(config).unwrap()
}

async fn wait_open(listener: &EventListener) {
    let mut state = listener.watch_channel_state();
    timeout(WAIT, state.wait_for(|s| *s == ChannelState::Open))
        .await
        .expect("timed out waiting for open stream")
        .unwrap();
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

async fn recv<T, Fut: Future<Output = Option<T>>>(next: Fut) -> T {
    timeout(WAIT, next)
        .await
        .expect("timed out waiting for update")
        .expect("update channel closed")
}

fn record_player(listener: &EventListener) -> mpsc::UnboundedReceiver<Arc<PlayerSnapshot>> {
    let (tx, rx) = mpsc::unbounded_channel();
    listener.on_player_state(move |snapshot| {
        let _ = tx.send(Arc::clone(snapshot));
    });
    rx
}

#[tokio::test]
async fn test_updates_reach_cache_and_subscribers() {
    let server = SseMockServer::start().await;
    let mut listener = listener_for(&server, ListenerConfig::default().with_idle_grace(Duration::ZERO));
    let mut players = record_player(&listener);

    assert!(listener.connect(Duration::from_millis(50)));
    wait_open(&listener).await;
    assert!(listener.is_connected());

    server.send(&player_message(0, "playing"));
    let snapshot = recv(players.recv()).await;
    assert_eq!(snapshot.playback_state, PlaybackState::Playing);
    assert_eq!(listener.player_state().as_deref(), Some(snapshot.as_ref()));

    server.send(&playlists_message());
    wait_until(|| listener.playlists().is_some()).await;
    assert_eq!(listener.playlists().unwrap().current().unwrap().id, "p1");

    listener.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_clears_cache_and_reconnect_repopulates() {
    let server = SseMockServer::start().await;
    let mut listener = listener_for(&server, ListenerConfig::default());
    let mut players = record_player(&listener);

    listener.connect(Duration::from_millis(50));
    wait_open(&listener).await;
    server.send(&playlists_message());
    server.send(&player_message(1, "playing"));
    recv(players.recv()).await;
    wait_until(|| listener.playlists().is_some()).await;

    listener.disconnect().await;
    assert!(!listener.is_connected());
    assert!(listener.player_state().is_none());
    assert!(listener.playlists().is_none());
    assert_eq!(listener.subscriber_count(UpdateClass::PlayerState), 1);

    assert!(listener.connect(Duration::from_millis(50)));
    wait_open(&listener).await;
    assert!(listener.player_state().is_none());

    server.send(&player_message(2, "paused"));
    let snapshot = recv(players.recv()).await;
    assert_eq!(snapshot.active_item.index, 2);
    assert_eq!(listener.player_state().unwrap().playback_state, PlaybackState::Paused);

    listener.disconnect().await;
}

#[tokio::test]
async fn test_connection_loss_clears_cache_and_keeps_subscribers() {
    let server = SseMockServer::start().await;
    let mut listener = listener_for(&server, ListenerConfig::default());
    let mut players = record_player(&listener);

    listener.connect(Duration::from_millis(20));
    wait_open(&listener).await;
    server.send(&player_message(0, "playing"));
    recv(players.recv()).await;

    server.close_all();
    wait_until(|| listener.player_state().is_none()).await;

    server.wait_for_connections(2).await;
    wait_open(&listener).await;
    server.send(&player_message(0, "paused"));
    let snapshot = recv(players.recv()).await;
    assert_eq!(snapshot.playback_state, PlaybackState::Paused);

    listener.disconnect().await;
}

#[tokio::test]
async fn test_play_pause_stop_with_zero_grace() {
    let server = SseMockServer::start().await;
    let mut listener = listener_for(&server, ListenerConfig::default().with_idle_grace(Duration::ZERO));
    let mut players = record_player(&listener);

    listener.connect(Duration::from_millis(50));
    wait_open(&listener).await;

    for (index, state) in [(0, "playing"), (0, "paused"), (0, "playing"), (-1, "stopped")] {
        server.send(&player_message(index, state));
    }

    let mut states = Vec::new();
    for _ in 0..4 {
        states.push(recv(players.recv()).await.playback_state.clone());
    }
    assert_eq!(
        states,
        vec![
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Playing,
            PlaybackState::Stopped,
        ]
    );
    assert!(listener.player_state().unwrap().is_idle());

    listener.disconnect().await;
}

#[tokio::test]
async fn test_track_change_blip_is_suppressed() {
    let server = SseMockServer::start().await;
    let grace = Duration::from_millis(300);
    let mut listener = listener_for(&server, ListenerConfig::default().with_idle_grace(grace));
    let mut players = record_player(&listener);

    listener.connect(Duration::from_millis(50));
    wait_open(&listener).await;

    server.send(&player_message(0, "playing"));
    assert_eq!(recv(players.recv()).await.active_item.index, 0);

    server.send(&player_message(-1, "stopped"));
    server.send(&player_message(1, "playing"));
    assert_eq!(recv(players.recv()).await.active_item.index, 1);

    tokio::time::sleep(grace * 2).await;
    assert!(players.try_recv().is_err());
    assert!(!listener.player_state().unwrap().is_idle());

    listener.disconnect().await;
}

#[tokio::test]
async fn test_playlist_item_window() {
    let server = SseMockServer::start().await;
    let config = ListenerConfig::default()
        .with_playlist("p1")
        .with_window(1, Some(2));
    let mut listener = listener_for(&server, config);

    let (tx, mut windows) = mpsc::unbounded_channel::<Arc<PlaylistItemsSnapshot>>();
    listener.on_playlist_items(move |window| {
        let _ = tx.send(Arc::clone(window));
    });

    listener.connect(Duration::from_millis(50));
    wait_open(&listener).await;

    let requests = server.received_requests().await;
    assert!(requests[0].contains("playlistItems=true"));
    assert!(requests[0].contains("plref=p1"));
    assert!(requests[0].contains("plrange=1%3A2"));

    let columns = json!(["A", "Album", "Artist", "3:00", "180", "/music/x.flac", "Title", "", "2"]);
    server.send(
        &json!({
            "playlistItems": {
                "offset": 1,
                "totalCount": 3,
                "items": [{"columns": columns}, {"columns": columns}]
            }
        })
        .to_string(),
    );

    let window = recv(windows.recv()).await;
    assert_eq!(window.offset, 1);
    assert_eq!(window.total_count, 3);
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].get("title"), Some("Title"));
    assert!(listener.playlists().is_none());

    listener.disconnect().await;
}

#[tokio::test]
async fn test_removed_callback_stops_receiving() {
    let server = SseMockServer::start().await;
    let mut listener = listener_for(&server, ListenerConfig::default());
    let mut kept = record_player(&listener);

    let (tx, mut removed_rx) = mpsc::unbounded_channel();
    let removed = listener.on_player_state(move |snapshot| {
        let _ = tx.send(Arc::clone(snapshot));
    });

    listener.connect(Duration::from_millis(50));
    wait_open(&listener).await;

    server.send(&player_message(0, "playing"));
    recv(kept.recv()).await;
    recv(removed_rx.recv()).await;

    assert!(listener.remove_subscriber(UpdateClass::PlayerState, &removed));
    server.send(&player_message(0, "paused"));
    recv(kept.recv()).await;
    assert!(removed_rx.try_recv().is_err());

    listener.disconnect().await;
}
