//! Event streaming for beefweb-sdk
//!
//! Beefweb pushes state changes as server-sent events from
//! `/api/query/updates`. Each event's data is a JSON object whose top-level
//! keys (`player`, `playlistItems`, `playlists`) name the parts of the state
//! that changed.
//!
//! # Architecture
//!
//! ```text
//! SubscriptionEndpoint → SubscriptionChannel → EventStreamCodec → ChannelEvent
//!                          (read loop,                              ↓
//!                           reconnect)                     decode_message → UpdateFragment
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use beefweb_api::ServerAddress;
//! use beefweb_stream::{decode_message, ChannelEvent, SubscriptionChannel, SubscriptionConfig, SubscriptionEndpoint};
//!
//! let address = ServerAddress::new("localhost", 8880)?;
//! let endpoint = SubscriptionEndpoint::new(&address, &SubscriptionConfig::default(), None)?;
//! let mut channel = SubscriptionChannel::new(endpoint)?;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! channel.connect(std::time::Duration::from_secs(5), tx);
//! while let Some(ChannelEvent::Message(raw)) = rx.recv().await {
//!     for fragment in decode_message(&raw)? {
//!         println!("{} changed", fragment.class);
//!     }
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;

pub use channel::{
    paced_interval, ChannelEvent, ChannelState, SubscriptionChannel, DEFAULT_RECONNECT_INTERVAL, MAX_CONNECT_ATTEMPTS,
    MIN_RECONNECT_INTERVAL,
};
pub use codec::{EventStreamCodec, SseEvent, DEFAULT_MAX_LINE_LENGTH};
pub use config::{SubscriptionConfig, SubscriptionEndpoint};
pub use decoder::{decode_message, UpdateClass, UpdateFragment};
pub use error::{Result, StreamError};
