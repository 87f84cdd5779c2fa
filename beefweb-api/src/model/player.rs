//! Player state snapshot

use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;

use super::playback_state::PlaybackState;
use super::time_format::{format_hhmmss, format_mmss};
use crate::error::{ApiError, Result};
use crate::fields::{FieldMap, FieldSelection};

/// Active item index reported when nothing is playing or selected
pub const NO_ACTIVE_ITEM: i64 = -1;

/// Identity of the remote player and the beefweb plugin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub name: String,
    pub title: String,
    pub version: String,
    pub plugin_version: String,
}

/// Volume control description and current level
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Scale of the control, e.g. `db` or `linear`
    #[serde(rename = "type")]
    pub kind: String,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub is_muted: bool,
}

/// One entry in the player's list of playback modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackMode {
    /// Number to send when selecting this mode
    pub number: usize,
    pub mode: String,
}

/// The player's current track
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveItem {
    pub playlist_id: String,
    pub playlist_index: i64,
    /// Position in its playlist, or [`NO_ACTIVE_ITEM`]
    pub index: i64,
    /// Playback position in seconds
    pub position: f64,
    /// Track length in seconds
    pub duration: f64,
    /// Requested metadata; always `None` when idle
    pub fields: Option<FieldMap>,
}

impl ActiveItem {
    /// True when the player reports no active item
    pub fn is_idle(&self) -> bool {
        self.index == NO_ACTIVE_ITEM
    }

    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    /// Position extrapolated from a capture instant
    ///
    /// While playing this is the reported position plus the time elapsed
    /// since `captured_at`, capped at the duration. Otherwise the reported
    /// position is returned unchanged.
    pub fn estimated_position(&self, state: &PlaybackState, captured_at: Instant) -> f64 {
        if state.is_playing() {
            let elapsed = captured_at.elapsed().as_secs_f64();
            (self.position + elapsed).min(self.duration)
        } else {
            self.position
        }
    }

    pub fn position_hhmmss(&self) -> String {
        format_hhmmss(self.position)
    }

    pub fn position_mmss(&self) -> String {
        format_mmss(self.position)
    }

    pub fn duration_hhmmss(&self) -> String {
        format_hhmmss(self.duration)
    }

    pub fn duration_mmss(&self) -> String {
        format_mmss(self.duration)
    }
}

/// Immutable, point-in-time view of the player
///
/// Built fresh from each `player` fragment and replaced wholesale by the
/// next one. Equality ignores the capture instant, so building twice from
/// the same payload yields equal snapshots.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub info: PlayerInfo,
    pub active_item: ActiveItem,
    pub volume: Volume,
    pub playback_state: PlaybackState,
    pub playback_modes: Vec<PlaybackMode>,
    pub playback_mode: PlaybackMode,
    /// When this snapshot was built, used to extrapolate position
    pub captured_at: Instant,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActiveItem {
    playlist_id: String,
    playlist_index: i64,
    index: i64,
    position: f64,
    duration: f64,
    #[serde(default)]
    columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayer {
    info: PlayerInfo,
    active_item: RawActiveItem,
    volume: Volume,
    playback_state: PlaybackState,
    playback_modes: Vec<String>,
    playback_mode: usize,
}

impl PlayerSnapshot {
    /// Build a snapshot from the value under a message's `player` key
    pub fn from_fragment(fragment: &Value, fields: &FieldSelection) -> Result<Self> {
        let raw = RawPlayer::deserialize(fragment).map_err(|e| ApiError::malformed("player", e))?;

        let playback_modes: Vec<PlaybackMode> = raw
            .playback_modes
            .into_iter()
            .enumerate()
            .map(|(number, mode)| PlaybackMode { number, mode })
            .collect();

        let playback_mode = playback_modes
            .get(raw.playback_mode)
            .cloned()
            .ok_or_else(|| {
                ApiError::malformed(
                    "player",
                    format!(
                        "playback mode {} out of range for {} modes",
                        raw.playback_mode,
                        playback_modes.len()
                    ),
                )
            })?;

        let active = raw.active_item;
        let item_fields = if active.index == NO_ACTIVE_ITEM || active.columns.is_empty() {
            None
        } else {
            Some(
                fields
                    .map_columns(active.columns)
                    .map_err(|e| ApiError::malformed("player.activeItem", e))?,
            )
        };

        Ok(Self {
            info: raw.info,
            active_item: ActiveItem {
                playlist_id: active.playlist_id,
                playlist_index: active.playlist_index,
                index: active.index,
                position: active.position,
                duration: active.duration,
                fields: item_fields,
            },
            volume: raw.volume,
            playback_state: raw.playback_state,
            playback_modes,
            playback_mode,
            captured_at: Instant::now(),
        })
    }

    /// True when the snapshot reports no active item
    pub fn is_idle(&self) -> bool {
        self.active_item.is_idle()
    }

    /// Playback position extrapolated to now
    pub fn estimated_position(&self) -> f64 {
        self.active_item
            .estimated_position(&self.playback_state, self.captured_at)
    }

    pub fn estimated_position_hhmmss(&self) -> String {
        format_hhmmss(self.estimated_position())
    }

    pub fn estimated_position_mmss(&self) -> String {
        format_mmss(self.estimated_position())
    }
}

impl PartialEq for PlayerSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
            && self.active_item == other.active_item
            && self.volume == other.volume
            && self.playback_state == other.playback_state
            && self.playback_modes == other.playback_modes
            && self.playback_mode == other.playback_mode
    }
}
