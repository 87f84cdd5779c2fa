//! Playlist listing snapshot and playlist references

use std::fmt;
use std::ops::Index;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Identifies a playlist either by its stable id or by its position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaylistRef {
    /// Stable playlist id such as `p3`
    Id(String),
    /// Zero-based position in the playlist list
    Index(u32),
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistRef::Id(id) => f.write_str(id),
            PlaylistRef::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PlaylistRef {
    fn from(id: &str) -> Self {
        PlaylistRef::Id(id.to_string())
    }
}

impl From<String> for PlaylistRef {
    fn from(id: String) -> Self {
        PlaylistRef::Id(id)
    }
}

impl From<u32> for PlaylistRef {
    fn from(index: u32) -> Self {
        PlaylistRef::Index(index)
    }
}

impl From<&PlaylistInfo> for PlaylistRef {
    fn from(info: &PlaylistInfo) -> Self {
        PlaylistRef::Id(info.id.clone())
    }
}

/// One playlist as listed by the player
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub id: String,
    pub index: u32,
    pub title: String,
    pub is_current: bool,
    pub item_count: u64,
    /// Combined length of all items in seconds
    pub total_time: f64,
}

/// Immutable list of the player's playlists, in display order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaylistsSnapshot {
    playlists: Vec<PlaylistInfo>,
}

impl PlaylistsSnapshot {
    /// Build a snapshot from the value under a message's `playlists` key
    pub fn from_fragment(fragment: &Value) -> Result<Self> {
        let playlists = Vec::<PlaylistInfo>::deserialize(fragment)
            .map_err(|e| ApiError::malformed("playlists", e))?;
        Ok(Self { playlists })
    }

    /// First playlist whose title or id matches
    ///
    /// With `find_last` the search runs from the end, which picks the newest
    /// of several playlists sharing a title.
    pub fn find(&self, title: Option<&str>, id: Option<&str>, find_last: bool) -> Option<&PlaylistInfo> {
        let matches = |p: &&PlaylistInfo| {
            title.is_some_and(|t| p.title == t) || id.is_some_and(|i| p.id == i)
        };
        if find_last {
            self.playlists.iter().rev().find(matches)
        } else {
            self.playlists.iter().find(matches)
        }
    }

    pub fn find_by_title(&self, title: &str) -> Option<&PlaylistInfo> {
        self.find(Some(title), None, false)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&PlaylistInfo> {
        self.find(None, Some(id), false)
    }

    /// The playlist currently selected in the player UI
    pub fn current(&self) -> Option<&PlaylistInfo> {
        self.playlists.iter().find(|p| p.is_current)
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistInfo> {
        self.playlists.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaylistInfo> {
        self.playlists.iter()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

impl Index<usize> for PlaylistsSnapshot {
    type Output = PlaylistInfo;

    fn index(&self, index: usize) -> &PlaylistInfo {
        &self.playlists[index]
    }
}

impl<'a> IntoIterator for &'a PlaylistsSnapshot {
    type Item = &'a PlaylistInfo;
    type IntoIter = std::slice::Iter<'a, PlaylistInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.playlists.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn playlists_fragment() -> Value {
        json!([
            {"id": "p1", "index": 0, "title": "Default", "isCurrent": false, "itemCount": 3, "totalTime": 600.0},
            {"id": "p2", "index": 1, "title": "Mix", "isCurrent": true, "itemCount": 10, "totalTime": 2400.5},
            {"id": "p3", "index": 2, "title": "Mix", "isCurrent": false, "itemCount": 0, "totalTime": 0.0}
        ])
    }

    #[test]
    fn test_build_and_index() {
        let snapshot = PlaylistsSnapshot::from_fragment(&playlists_fragment()).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[1].title, "Mix");
        assert_eq!(snapshot.current().map(|p| p.id.as_str()), Some("p2"));
        assert_eq!(snapshot.iter().map(|p| p.item_count).sum::<u64>(), 13);
    }

    #[test]
    fn test_find_first_and_last() {
        let snapshot = PlaylistsSnapshot::from_fragment(&playlists_fragment()).unwrap();
        assert_eq!(snapshot.find_by_title("Mix").map(|p| p.id.as_str()), Some("p2"));
        assert_eq!(
            snapshot.find(Some("Mix"), None, true).map(|p| p.id.as_str()),
            Some("p3")
        );
        assert_eq!(snapshot.find_by_id("p1").map(|p| p.index), Some(0));
        assert!(snapshot.find(None, None, false).is_none());
        assert!(snapshot.find_by_title("Missing").is_none());
    }

    #[test]
    fn test_missing_key_is_malformed() {
        let fragment = json!([{"id": "p1", "index": 0, "title": "Default"}]);
        let result = PlaylistsSnapshot::from_fragment(&fragment);
        assert!(matches!(result, Err(ApiError::MalformedPayload(_))));
    }

    #[test]
    fn test_playlist_ref_display() {
        assert_eq!(PlaylistRef::from("p4").to_string(), "p4");
        assert_eq!(PlaylistRef::from(2u32).to_string(), "2");

        let snapshot = PlaylistsSnapshot::from_fragment(&playlists_fragment()).unwrap();
        assert_eq!(PlaylistRef::from(&snapshot[2]), PlaylistRef::Id("p3".to_string()));
    }
}
