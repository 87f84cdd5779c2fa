//! Subscription configuration and endpoint construction
//!
//! A [`SubscriptionConfig`] decides what the server pushes: player state and
//! the playlist listing are always requested, and a window of playlist items
//! is added when a playlist is named. [`SubscriptionEndpoint`] turns that into
//! the single URL the channel streams from, plus the credentials it sends.

use beefweb_api::{Credentials, Endpoint, FieldSelection, PlaylistRef, ServerAddress, UNBOUNDED_COUNT};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use url::Url;

use crate::error::{Result, StreamError};

/// What the event stream should carry
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionConfig {
    /// Metadata requested for the active item
    /// Default: [`FieldSelection::default`]
    pub active_item_fields: FieldSelection,

    /// Playlist whose items are streamed; `None` disables item updates
    /// Default: None
    pub playlist_ref: Option<PlaylistRef>,

    /// Metadata requested for each playlist item
    /// Default: [`FieldSelection::default`]
    pub playlist_item_fields: FieldSelection,

    /// Position of the first item in the window
    /// Default: 0
    pub window_offset: u32,

    /// Number of items in the window, `None` for the rest of the playlist
    /// Default: None
    pub window_count: Option<u32>,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            active_item_fields: FieldSelection::default(),
            playlist_ref: None,
            playlist_item_fields: FieldSelection::default(),
            window_offset: 0,
            window_count: None,
        }
    }
}

impl SubscriptionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active_item_fields(mut self, fields: FieldSelection) -> Self {
        self.active_item_fields = fields;
        self
    }

    pub fn with_playlist(mut self, playlist: impl Into<PlaylistRef>) -> Self {
        self.playlist_ref = Some(playlist.into());
        self
    }

    pub fn with_playlist_item_fields(mut self, fields: FieldSelection) -> Self {
        self.playlist_item_fields = fields;
        self
    }

    pub fn with_window(mut self, offset: u32, count: Option<u32>) -> Self {
        self.window_offset = offset;
        self.window_count = count;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.active_item_fields.is_empty() {
            return Err(StreamError::ConfigurationError(
                "active item field selection must not be empty".to_string(),
            ));
        }
        if self.playlist_ref.is_some() && self.playlist_item_fields.is_empty() {
            return Err(StreamError::ConfigurationError(
                "playlist item field selection must not be empty".to_string(),
            ));
        }
        if self.window_count == Some(0) {
            return Err(StreamError::ConfigurationError(
                "window count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Query string for `/api/query/updates`
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("player", "true".to_string()),
            ("trcolumns", self.active_item_fields.query_value()),
            ("playlists", "true".to_string()),
        ];

        if let Some(playlist) = &self.playlist_ref {
            params.push(("playlistItems", "true".to_string()));
            params.push(("plref", playlist.to_string()));
            params.push(("plcolumns", self.playlist_item_fields.query_value()));
            params.push((
                "plrange",
                format!(
                    "{}:{}",
                    self.window_offset,
                    self.window_count.unwrap_or(UNBOUNDED_COUNT)
                ),
            ));
        }
        params
    }

    /// True when playlist item windows are part of the subscription
    pub fn includes_playlist_items(&self) -> bool {
        self.playlist_ref.is_some()
    }
}

/// Fixed URL and credentials of one event stream
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionEndpoint {
    url: Url,
    credentials: Option<Credentials>,
}

impl SubscriptionEndpoint {
    pub fn new(address: &ServerAddress, config: &SubscriptionConfig, credentials: Option<Credentials>) -> Result<Self> {
        config.validate()?;

        let path = Endpoint::QueryUpdates.render_path(&[])?;
        let mut url = address.url_for(&path);
        url.query_pairs_mut().extend_pairs(config.query_params());

        Ok(Self { url, credentials })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// GET request that opens the stream
    pub(crate) fn request(&self, http: &reqwest::Client) -> reqwest::RequestBuilder {
        let request = http
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        match &self.credentials {
            Some(credentials) => credentials.apply(request),
            None => request,
        }
    }
}
