//! File browser listings

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Whether a browser entry is a file or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A file or directory visible to the player
#[derive(Debug, Clone, PartialEq)]
pub struct FileSystemEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes, 0 for directories
    pub size: u64,
    pub timestamp: u64,
}

impl FileSystemEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Result of a browser roots or entries query
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserEntries {
    pub path_separator: String,
    pub entries: Vec<FileSystemEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    timestamp: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListing {
    path_separator: String,
    #[serde(alias = "roots")]
    entries: Vec<RawEntry>,
}

impl BrowserEntries {
    /// Parse a `/browser/roots` or `/browser/entries` response
    pub fn from_response(response: &Value) -> Result<Self> {
        let raw = RawListing::deserialize(response)
            .map_err(|e| ApiError::ParseError(format!("browser listing: {e}")))?;

        let entries = raw
            .entries
            .into_iter()
            .map(|entry| FileSystemEntry {
                kind: if entry.kind == "F" {
                    EntryKind::File
                } else {
                    EntryKind::Directory
                },
                name: entry.name,
                path: entry.path,
                size: entry.size,
                timestamp: entry.timestamp,
            })
            .collect();

        Ok(Self {
            path_separator: raw.path_separator,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roots_listing() {
        let response = json!({
            "pathSeparator": "\\",
            "roots": [
                {"name": "Music", "path": "C:\\Music", "type": "D", "size": 0, "timestamp": 1600000000}
            ]
        });
        let listing = BrowserEntries::from_response(&response).unwrap();
        assert_eq!(listing.path_separator, "\\");
        assert!(listing.entries[0].is_directory());
    }

    #[test]
    fn test_entries_listing() {
        let response = json!({
            "pathSeparator": "/",
            "entries": [
                {"name": "a.flac", "path": "/music/a.flac", "type": "F", "size": 1024, "timestamp": 1},
                {"name": "albums", "path": "/music/albums", "type": "D", "size": 0, "timestamp": 2}
            ]
        });
        let listing = BrowserEntries::from_response(&response).unwrap();
        assert_eq!(listing.entries.len(), 2);
        assert!(listing.entries[0].is_file());
        assert_eq!(listing.entries[0].size, 1024);
        assert!(listing.entries[1].is_directory());
    }

    #[test]
    fn test_missing_separator_is_parse_error() {
        let result = BrowserEntries::from_response(&json!({"entries": []}));
        assert!(matches!(result, Err(ApiError::ParseError(_))));
    }
}
