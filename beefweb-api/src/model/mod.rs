//! Typed snapshots of remote player state
//!
//! Every snapshot is built from one raw JSON fragment by a pure
//! `from_fragment` constructor and is never mutated afterwards.

pub mod browser;
pub mod playback_state;
pub mod player;
pub mod playlist_items;
pub mod playlists;
pub mod time_format;

pub use browser::{BrowserEntries, EntryKind, FileSystemEntry};
pub use playback_state::PlaybackState;
pub use player::{ActiveItem, PlaybackMode, PlayerInfo, PlayerSnapshot, Volume, NO_ACTIVE_ITEM};
pub use playlist_items::PlaylistItemsSnapshot;
pub use playlists::{PlaylistInfo, PlaylistRef, PlaylistsSnapshot};
pub use time_format::{format_hhmmss, format_mmss};
