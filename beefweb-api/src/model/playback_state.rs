//! Playback state enumeration

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Current playback state of the player
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Currently playing audio
    Playing,
    /// Playback is paused
    Paused,
    /// Playback is stopped
    Stopped,
    /// A state this client does not know, kept as sent (lowercased)
    Other(String),
}

impl PlaybackState {
    /// Parse from beefweb's `playbackState` string
    ///
    /// Matching is case-insensitive; unrecognised values are kept as
    /// [`PlaybackState::Other`].
    pub fn from_api_state(state: &str) -> Self {
        let state = state.to_ascii_lowercase();
        match state.as_str() {
            "playing" => PlaybackState::Playing,
            "paused" => PlaybackState::Paused,
            "stopped" => PlaybackState::Stopped,
            _ => PlaybackState::Other(state),
        }
    }

    /// The wire spelling of this state
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Other(state) => state,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Stopped
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlaybackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlaybackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PlaybackState::from_api_state(&raw))
    }
}
