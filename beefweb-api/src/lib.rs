//! Typed API for the beefweb foobar2000 remote control plugin
//!
//! This crate holds the data model shared by the request client and the
//! event stream: snapshots of player state, the playlist listing and
//! playlist item windows, plus the field selections that decide which
//! metadata columns are requested.
//!
//! # Request client
//!
//! ```rust,ignore
//! use beefweb_api::{BeefwebClient, FieldSelection, PlaylistRef};
//!
//! let client = BeefwebClient::new("192.168.1.20", 8880, None)?;
//! client.play_specific(&PlaylistRef::Index(0), 2).await?;
//!
//! let state = client.get_player_state(&FieldSelection::default()).await?;
//! println!("{} at {}", state.playback_state, state.estimated_position_mmss());
//! ```
//!
//! # Snapshot builders
//!
//! Each snapshot has a pure `from_fragment` constructor taking the raw JSON
//! value found under its key (`player`, `playlists`, `playlistItems`). A
//! fragment missing required keys yields [`ApiError::MalformedPayload`].

pub mod client;
pub mod endpoint;
pub mod error;
pub mod fields;
pub mod model;

pub use client::{build_http_client, BeefwebClient, Credentials, PlayerStateChange, ServerAddress, UNBOUNDED_COUNT};
pub use endpoint::{Endpoint, EndpointInfo, API_PREFIX};
pub use error::{ApiError, Result};
pub use fields::{FieldMap, FieldSelection, DEFAULT_FIELDS};
pub use model::{
    ActiveItem, BrowserEntries, EntryKind, FileSystemEntry, PlaybackMode, PlaybackState, PlayerInfo,
    PlayerSnapshot, PlaylistInfo, PlaylistItemsSnapshot, PlaylistRef, PlaylistsSnapshot, Volume,
    NO_ACTIVE_ITEM,
};
