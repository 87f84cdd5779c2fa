//! Event listener
//!
//! [`EventListener`] keeps a local mirror of the player and the playlist
//! listing in sync with a beefweb server, and hands every accepted update to
//! the callbacks registered for its class.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use beefweb_api::{PlayerSnapshot, PlaylistItemsSnapshot, PlaylistsSnapshot};
use beefweb_stream::{ChannelState, SubscriptionChannel, UpdateClass};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ListenerConfig;
use crate::debounce::DebounceGate;
use crate::error::Result;
use crate::processor::{SharedCache, UpdateProcessor};
use crate::subscribers::{Callback, SubscriberRegistry, Update};

struct ProcessorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Keeps player and playlist state synchronized with a beefweb server
///
/// Subscribers survive disconnects; cached snapshots do not.
///
/// # Example
///
/// ```rust,ignore
/// use beefweb_state::{EventListener, ListenerConfig};
///
/// let mut listener = EventListener::new(ListenerConfig::new("192.168.1.20", 8880))?;
/// listener.on_player_state(|player| {
///     println!("{} {}", player.playback_state, player.estimated_position_mmss());
/// });
/// listener.connect_default();
/// ```
pub struct EventListener {
    config: ListenerConfig,
    channel: SubscriptionChannel,
    cache: SharedCache,
    subscribers: Arc<SubscriberRegistry>,
    processor: Option<ProcessorTask>,
}

impl EventListener {
    /// Create a disconnected listener
    pub fn new(config: ListenerConfig) -> Result<Self> {
        let endpoint = config.subscription_endpoint()?;
        let channel = SubscriptionChannel::new(endpoint)?;

        tracing::debug!(url = %channel.endpoint().url(), "event listener created");

        Ok(Self {
            config,
            channel,
            cache: SharedCache::default(),
            subscribers: Arc::new(SubscriberRegistry::new()),
            processor: None,
        })
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Register a callback for one update class
    ///
    /// Returns false if this callback was already registered for the class.
    pub fn add_subscriber(&self, class: UpdateClass, callback: Callback) -> bool {
        self.subscribers.add(class, callback)
    }

    /// Register a callback by class name (`player_state`, `playlist_items`
    /// or `playlists`)
    pub fn add_subscriber_named(&self, class: &str, callback: Callback) -> Result<bool> {
        let class = UpdateClass::from_str(class)?;
        Ok(self.add_subscriber(class, callback))
    }

    /// Unregister a callback; removing a non-member is a no-op
    pub fn remove_subscriber(&self, class: UpdateClass, callback: &Callback) -> bool {
        self.subscribers.remove(class, callback)
    }

    pub fn remove_subscriber_named(&self, class: &str, callback: &Callback) -> Result<bool> {
        let class = UpdateClass::from_str(class)?;
        Ok(self.remove_subscriber(class, callback))
    }

    pub fn remove_all_subscribers(&self) {
        self.subscribers.remove_all();
    }

    pub fn subscriber_count(&self, class: UpdateClass) -> usize {
        self.subscribers.count(class)
    }

    /// Subscribe to player snapshots, returning the handle for removal
    pub fn on_player_state<F>(&self, f: F) -> Callback
    where
        F: Fn(&Arc<PlayerSnapshot>) + Send + Sync + 'static,
    {
        let callback = Callback::new(move |update: &Update| {
            if let Some(snapshot) = update.player_state() {
                f(snapshot);
            }
        });
        self.add_subscriber(UpdateClass::PlayerState, callback.clone());
        callback
    }

    pub fn on_playlists<F>(&self, f: F) -> Callback
    where
        F: Fn(&Arc<PlaylistsSnapshot>) + Send + Sync + 'static,
    {
        let callback = Callback::new(move |update: &Update| {
            if let Some(snapshot) = update.playlists() {
                f(snapshot);
            }
        });
        self.add_subscriber(UpdateClass::Playlists, callback.clone());
        callback
    }

    pub fn on_playlist_items<F>(&self, f: F) -> Callback
    where
        F: Fn(&Arc<PlaylistItemsSnapshot>) + Send + Sync + 'static,
    {
        let callback = Callback::new(move |update: &Update| {
            if let Some(snapshot) = update.playlist_items() {
                f(snapshot);
            }
        });
        self.add_subscriber(UpdateClass::PlaylistItems, callback.clone());
        callback
    }

    /// Open the update stream
    ///
    /// No-op (returns false) while already open or connecting. Lost
    /// connections are retried every `reconnect_interval` (never less than
    /// [`MIN_RECONNECT_INTERVAL`](beefweb_stream::MIN_RECONNECT_INTERVAL))
    /// until [`disconnect`](Self::disconnect) is called. Must be called from
    /// within a Tokio runtime.
    pub fn connect(&mut self, reconnect_interval: Duration) -> bool {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        if !self.channel.connect(reconnect_interval, events_tx) {
            tracing::debug!("connect ignored, channel already active");
            return false;
        }

        if let Some(stale) = self.processor.take() {
            stale.cancel.cancel();
        }

        let processor = UpdateProcessor::new(
            self.config.active_item_selection(),
            self.config.playlist_item_selection(),
            DebounceGate::new(self.config.idle_grace),
            Arc::clone(&self.cache),
            Arc::clone(&self.subscribers),
        );
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(processor.run(events_rx, cancel.clone()));
        self.processor = Some(ProcessorTask { cancel, handle });

        tracing::info!(url = %self.channel.endpoint().url(), "event listener connecting");
        true
    }

    /// [`connect`](Self::connect) with the configured reconnect interval
    pub fn connect_default(&mut self) -> bool {
        self.connect(self.config.reconnect_interval)
    }

    /// Close the stream and drop all cached state
    ///
    /// Any held idle update is discarded. Subscribers stay registered.
    pub async fn disconnect(&mut self) {
        if let Some(task) = self.processor.take() {
            task.cancel.cancel();
            if let Err(error) = task.handle.await {
                if !error.is_cancelled() {
                    tracing::warn!(%error, "update processor ended abnormally");
                }
            }
        }

        self.channel.disconnect().await;
        self.cache.write().clear();
        tracing::info!("event listener disconnected");
    }

    /// True only while the stream is open
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn watch_channel_state(&self) -> watch::Receiver<ChannelState> {
        self.channel.watch_state()
    }

    /// Latest accepted player snapshot, unset until the first update
    pub fn player_state(&self) -> Option<Arc<PlayerSnapshot>> {
        self.cache.read().player.clone()
    }

    /// Latest playlist listing, unset until the first update
    pub fn playlists(&self) -> Option<Arc<PlaylistsSnapshot>> {
        self.cache.read().playlists.clone()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        if let Some(task) = self.processor.take() {
            task.cancel.cancel();
        }
    }
}
