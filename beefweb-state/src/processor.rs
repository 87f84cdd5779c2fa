//! Turns channel events into accepted snapshots
//!
//! One processor task runs per connected listener. It owns the debounce gate
//! and handles each event to completion before taking the next, so updates
//! are never processed concurrently.

use std::sync::Arc;

use beefweb_api::{FieldSelection, PlayerSnapshot, PlaylistItemsSnapshot, PlaylistsSnapshot};
use beefweb_stream::{decode_message, ChannelEvent, UpdateClass, UpdateFragment};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::debounce::{DebounceGate, GateDecision};
use crate::subscribers::{SubscriberRegistry, Update};

/// Latest accepted snapshots
#[derive(Debug, Default)]
pub struct SnapshotCache {
    pub player: Option<Arc<PlayerSnapshot>>,
    pub playlists: Option<Arc<PlaylistsSnapshot>>,
}

impl SnapshotCache {
    pub fn clear(&mut self) {
        self.player = None;
        self.playlists = None;
    }
}

pub(crate) type SharedCache = Arc<RwLock<SnapshotCache>>;

pub(crate) struct UpdateProcessor {
    active_item_fields: FieldSelection,
    playlist_item_fields: FieldSelection,
    cache: SharedCache,
    subscribers: Arc<SubscriberRegistry>,
    gate: DebounceGate,
}

impl UpdateProcessor {
    pub(crate) fn new(
        active_item_fields: FieldSelection,
        playlist_item_fields: FieldSelection,
        gate: DebounceGate,
        cache: SharedCache,
        subscribers: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            active_item_fields,
            playlist_item_fields,
            cache,
            subscribers,
            gate,
        }
    }

    /// Process channel events until cancelled or the channel side hangs up
    pub(crate) async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                held = self.gate.expired() => {
                    tracing::debug!("idle player update survived grace window");
                    self.accept_player(held);
                }

                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }

        self.gate.cancel();
        tracing::debug!("update processor stopped");
    }

    fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                tracing::info!("update stream opened");
            }
            ChannelEvent::Message(raw) => self.handle_message(&raw),
            ChannelEvent::ConnectionLost(error) => {
                tracing::warn!(%error, "update stream lost, clearing cached state");
                self.gate.cancel();
                self.cache.write().clear();
            }
        }
    }

    fn handle_message(&mut self, raw: &str) {
        let fragments = match decode_message(raw) {
            Ok(fragments) => fragments,
            Err(error) => {
                tracing::warn!(%error, "dropping undecodable update message");
                return;
            }
        };

        for fragment in fragments {
            let class = fragment.class;
            if let Err(error) = self.apply_fragment(fragment) {
                tracing::warn!(%class, %error, "dropping malformed update fragment");
            }
        }
    }

    fn apply_fragment(&mut self, fragment: UpdateFragment) -> beefweb_api::Result<()> {
        match fragment.class {
            UpdateClass::PlayerState => {
                let snapshot = PlayerSnapshot::from_fragment(&fragment.payload, &self.active_item_fields)?;
                let had_previous = self.cache.read().player.is_some();

                if let GateDecision::Deliver(snapshot) = self.gate.offer(Arc::new(snapshot), had_previous) {
                    self.accept_player(snapshot);
                }
            }
            UpdateClass::Playlists => {
                let snapshot = Arc::new(PlaylistsSnapshot::from_fragment(&fragment.payload)?);
                self.cache.write().playlists = Some(Arc::clone(&snapshot));
                self.subscribers.dispatch(&Update::Playlists(snapshot));
            }
            UpdateClass::PlaylistItems => {
                let snapshot =
                    PlaylistItemsSnapshot::from_fragment(&fragment.payload, &self.playlist_item_fields)?;
                self.subscribers
                    .dispatch(&Update::PlaylistItems(Arc::new(snapshot)));
            }
        }
        Ok(())
    }

    fn accept_player(&mut self, snapshot: Arc<PlayerSnapshot>) {
        tracing::trace!(
            state = %snapshot.playback_state,
            index = snapshot.active_item.index,
            "player update accepted"
        );
        self.cache.write().player = Some(Arc::clone(&snapshot));
        self.subscribers.dispatch(&Update::PlayerState(snapshot));
    }
}
