//! Beefweb State
//!
//! A local mirror of a foobar2000 player, kept in sync over beefweb's update
//! stream.
//!
//! # Features
//!
//! - **Cached snapshots**: the latest player state and playlist listing,
//!   unset while disconnected
//! - **Subscribers**: callbacks per update class (`player_state`,
//!   `playlist_items`, `playlists`)
//! - **Idle debounce**: the brief "no active item" report during track
//!   changes is held back for a grace window and dropped if superseded
//! - **Reconnection**: lost streams are retried until disconnected
//!
//! # Architecture
//!
//! ```text
//! SubscriptionChannel → decode_message → snapshot builders → DebounceGate (player only)
//!                                                                 ↓
//!                                              SnapshotCache + SubscriberRegistry
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use beefweb_state::{EventListener, ListenerConfig};
//!
//! let config = ListenerConfig::new("192.168.1.20", 8880)
//!     .with_playlist("p1")
//!     .with_window(0, Some(20));
//! let mut listener = EventListener::new(config)?;
//!
//! let handle = listener.on_player_state(|player| {
//!     println!("{} at {}", player.playback_state, player.estimated_position_mmss());
//! });
//! listener.on_playlist_items(|window| {
//!     for (index, item) in window.iter().enumerate() {
//!         println!("{} {:?}", window.offset + index as u64, item.get("title"));
//!     }
//! });
//!
//! listener.connect(Duration::from_secs(5));
//! // ...
//! listener.remove_subscriber(beefweb_state::UpdateClass::PlayerState, &handle);
//! listener.disconnect().await;
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod listener;
pub mod logging;
pub mod processor;
pub mod subscribers;

pub use config::{ListenerConfig, DEFAULT_IDLE_GRACE, DEFAULT_PORT};
pub use debounce::{DebounceGate, GateDecision};
pub use error::{Result, StateError};
pub use listener::EventListener;
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use processor::SnapshotCache;
pub use subscribers::{Callback, SubscriberRegistry, Update};

pub use beefweb_stream::{ChannelState, UpdateClass};
