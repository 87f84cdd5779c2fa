//! Playlist item window snapshot

use std::ops::Index;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::fields::{FieldMap, FieldSelection};

/// A window of items from one playlist
///
/// Holds only the requested range: `offset` is the playlist position of the
/// first returned item and `total_count` the size of the whole playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaylistItemsSnapshot {
    pub offset: u64,
    pub total_count: u64,
    items: Vec<FieldMap>,
}

#[derive(Deserialize)]
struct RawItem {
    columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItems {
    offset: u64,
    total_count: u64,
    items: Vec<RawItem>,
}

impl PlaylistItemsSnapshot {
    /// Build a snapshot from the value under a message's `playlistItems` key
    pub fn from_fragment(fragment: &Value, fields: &FieldSelection) -> Result<Self> {
        let raw = RawItems::deserialize(fragment)
            .map_err(|e| ApiError::malformed("playlistItems", e))?;

        let items = raw
            .items
            .into_iter()
            .map(|item| fields.map_columns(item.columns))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| ApiError::malformed("playlistItems", e))?;

        Ok(Self {
            offset: raw.offset,
            total_count: raw.total_count,
            items,
        })
    }

    /// Items whose fields equal every `(name, value)` criterion
    ///
    /// Returns each match with its absolute playlist position. Comparison is
    /// case-insensitive unless `case_sensitive` is set; a criterion naming a
    /// field that was not selected never matches.
    pub fn find_items(&self, criteria: &[(&str, &str)], case_sensitive: bool) -> Vec<(u64, &FieldMap)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                criteria.iter().all(|(name, wanted)| match item.get(name) {
                    Some(value) if case_sensitive => value == *wanted,
                    Some(value) => value.to_lowercase() == wanted.to_lowercase(),
                    None => false,
                })
            })
            .map(|(i, item)| (self.offset + i as u64, item))
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&FieldMap> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMap> {
        self.items.iter()
    }

    /// Number of items in this window
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Index<usize> for PlaylistItemsSnapshot {
    type Output = FieldMap;

    fn index(&self, index: usize) -> &FieldMap {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a PlaylistItemsSnapshot {
    type Item = &'a FieldMap;
    type IntoIter = std::slice::Iter<'a, FieldMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
