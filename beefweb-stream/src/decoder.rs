//! Splits one streamed message into update fragments

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Result, StreamError};

/// The three kinds of update the event stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateClass {
    PlayerState,
    PlaylistItems,
    Playlists,
}

impl UpdateClass {
    pub const ALL: [UpdateClass; 3] = [
        UpdateClass::PlayerState,
        UpdateClass::PlaylistItems,
        UpdateClass::Playlists,
    ];

    /// Subscriber-facing name, e.g. `player_state`
    pub fn name(&self) -> &'static str {
        match self {
            UpdateClass::PlayerState => "player_state",
            UpdateClass::PlaylistItems => "playlist_items",
            UpdateClass::Playlists => "playlists",
        }
    }

    /// Top-level key of this class in a streamed message
    pub fn message_key(&self) -> &'static str {
        match self {
            UpdateClass::PlayerState => "player",
            UpdateClass::PlaylistItems => "playlistItems",
            UpdateClass::Playlists => "playlists",
        }
    }

    fn from_message_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.message_key() == key)
    }
}

impl fmt::Display for UpdateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpdateClass {
    type Err = StreamError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.name() == name)
            .ok_or_else(|| StreamError::UnknownUpdateClass(name.to_string()))
    }
}

/// The raw payload for one update class within a message
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFragment {
    pub class: UpdateClass,
    pub payload: Value,
}

/// Parse a streamed message into its fragments, in message key order
///
/// Keys other than `player`, `playlistItems` and `playlists` are ignored.
/// Anything that is not a JSON object is a `DecodeFailure`.
pub fn decode_message(raw: &str) -> Result<Vec<UpdateFragment>> {
    let message: Map<String, Value> =
        serde_json::from_str(raw).map_err(|e| StreamError::DecodeFailure(e.to_string()))?;

    Ok(message
        .into_iter()
        .filter_map(|(key, payload)| {
            let class = UpdateClass::from_message_key(&key);
            if class.is_none() {
                tracing::debug!("Ignoring unknown update key '{}'", key);
            }
            class.map(|class| UpdateFragment { class, payload })
        })
        .collect())
}
