use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::fields::FieldSelection;
use crate::model::{BrowserEntries, PlayerSnapshot, PlaylistInfo, PlaylistItemsSnapshot, PlaylistRef, PlaylistsSnapshot};

/// Default timeout for one-shot requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Item count meaning "to the end of the playlist" in a `plrange`
pub const UNBOUNDED_COUNT: u32 = 1_000_000;

/// HTTP basic-auth credentials for a password-protected server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Attach these credentials to an outgoing request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Scheme, host and port of a beefweb server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    base: Url,
}

impl ServerAddress {
    /// Build from a host (with or without `http://`) and a port
    pub fn new(base_address: &str, port: u16) -> Result<Self> {
        let trimmed = base_address.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::InvalidParameter("empty base address".to_string()));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let mut base = Url::parse(&with_scheme)?;
        base.set_port(Some(port))
            .map_err(|_| ApiError::InvalidParameter(format!("cannot set port on {with_scheme}")))?;
        Ok(Self { base })
    }

    /// Build from a full `http://host:port` url
    pub fn from_url(url: &str) -> Result<Self> {
        let base = Url::parse(url)?;
        if base.host_str().is_none() {
            return Err(ApiError::InvalidParameter(format!("no host in {url}")));
        }
        Ok(Self { base })
    }

    /// Url for an absolute path on this server
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    pub fn as_url(&self) -> &Url {
        &self.base
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str().trim_end_matches('/'))
    }
}

/// Build the HTTP client used for beefweb traffic
///
/// Header names go out title-cased because the server matches
/// `Authorization` case-sensitively. `timeout` of `None` disables the
/// overall request timeout, which long-lived event streams need.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().http1_title_case_headers();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout).connect_timeout(timeout);
    }
    builder.build().map_err(ApiError::from)
}

fn bool_param(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

fn fragment<'a>(response: &'a Option<Value>, key: &str) -> Result<&'a Value> {
    response
        .as_ref()
        .and_then(|value| value.get(key))
        .ok_or_else(|| ApiError::malformed(key, "missing from response"))
}

/// Optional changes applied by [`BeefwebClient::set_player_state`]
///
/// Fields left as `None` are not sent and stay unchanged on the player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStateChange {
    /// Volume in the player's own scale, see `Volume::min`/`max`
    pub volume: Option<f64>,
    pub is_muted: Option<bool>,
    /// Absolute position in seconds
    pub position: Option<f64>,
    /// Seconds to add to (or subtract from) the current position
    pub relative_position: Option<f64>,
    /// Number of a `PlaybackMode`
    pub playback_mode: Option<usize>,
}

impl PlayerStateChange {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(volume) = self.volume {
            params.push(("volume", volume.to_string()));
        }
        if let Some(muted) = self.is_muted {
            params.push(("isMuted", bool_param(muted)));
        }
        if let Some(position) = self.position {
            params.push(("position", position.to_string()));
        }
        if let Some(relative) = self.relative_position {
            params.push(("relativePosition", relative.to_string()));
        }
        if let Some(mode) = self.playback_mode {
            params.push(("playbackMode", mode.to_string()));
        }
        params
    }
}

/// Async client for beefweb's request/response routes
///
/// Each call is independent; the client holds no player state. Event
/// streaming lives in the stream crate.
#[derive(Debug, Clone)]
pub struct BeefwebClient {
    http: reqwest::Client,
    address: ServerAddress,
    credentials: Option<Credentials>,
}

impl BeefwebClient {
    pub fn new(base_address: &str, port: u16, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_address(ServerAddress::new(base_address, port)?, credentials)
    }

    pub fn with_address(address: ServerAddress, credentials: Option<Credentials>) -> Result<Self> {
        Ok(Self {
            http: build_http_client(Some(DEFAULT_REQUEST_TIMEOUT))?,
            address,
            credentials,
        })
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
        path_params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = self.address.url_for(&endpoint.render_path(path_params)?);
        tracing::debug!("{} {}", endpoint.method(), url);

        let mut request = self.http.request(endpoint.method(), url).query(params);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(credentials) = &self.credentials {
            request = credentials.apply(request);
        }

        let response = request.send().await?;
        let status = response.status();
        if ![StatusCode::OK, StatusCode::ACCEPTED, StatusCode::NO_CONTENT].contains(&status) {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("{:?} failed with status {}", endpoint, status);
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Issue one request and decode its JSON body, if any
    pub async fn request(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
        path_params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let response = self.send(endpoint, params, path_params, body).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ApiError::ParseError(e.to_string()))
    }

    // Player

    pub async fn get_player_state(&self, fields: &FieldSelection) -> Result<PlayerSnapshot> {
        let params = [("columns", fields.query_value())];
        let response = self.request(Endpoint::GetPlayerState, &params, &[], None).await?;
        PlayerSnapshot::from_fragment(fragment(&response, "player")?, fields)
    }

    pub async fn set_player_state(&self, change: &PlayerStateChange) -> Result<()> {
        let params = change.to_params();
        self.request(Endpoint::SetPlayerState, &params, &[], None).await?;
        Ok(())
    }

    /// Start playback in the playlist last played from
    pub async fn play(&self) -> Result<()> {
        self.request(Endpoint::Play, &[], &[], None).await.map(drop)
    }

    pub async fn play_specific(&self, playlist: &PlaylistRef, index: u32) -> Result<()> {
        let path_params = [("playlist_ref", playlist.to_string()), ("index", index.to_string())];
        self.request(Endpoint::PlaySpecific, &[], &path_params, None).await.map(drop)
    }

    pub async fn play_random(&self) -> Result<()> {
        self.request(Endpoint::PlayRandom, &[], &[], None).await.map(drop)
    }

    /// Skip forward; `by` names a field to skip to the next different value of
    pub async fn play_next(&self, by: Option<&str>) -> Result<()> {
        let params: Vec<(&str, String)> = by.map(|by| ("by", by.to_string())).into_iter().collect();
        self.request(Endpoint::PlayNext, &params, &[], None).await.map(drop)
    }

    pub async fn play_previous(&self, by: Option<&str>) -> Result<()> {
        let params: Vec<(&str, String)> = by.map(|by| ("by", by.to_string())).into_iter().collect();
        self.request(Endpoint::PlayPrevious, &params, &[], None).await.map(drop)
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(Endpoint::Stop, &[], &[], None).await.map(drop)
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(Endpoint::Pause, &[], &[], None).await.map(drop)
    }

    pub async fn pause_toggle(&self) -> Result<()> {
        self.request(Endpoint::PauseToggle, &[], &[], None).await.map(drop)
    }

    // Playlists

    pub async fn get_playlists(&self) -> Result<PlaylistsSnapshot> {
        let params = [("playlists", bool_param(true))];
        let response = self.request(Endpoint::Query, &params, &[], None).await?;
        PlaylistsSnapshot::from_fragment(fragment(&response, "playlists")?)
    }

    pub async fn find_playlist(
        &self,
        title: Option<&str>,
        id: Option<&str>,
        find_last: bool,
    ) -> Result<Option<PlaylistInfo>> {
        let playlists = self.get_playlists().await?;
        Ok(playlists.find(title, id, find_last).cloned())
    }

    /// Fetch `count` items starting at `offset`; `None` reads to the end
    pub async fn get_playlist_items(
        &self,
        playlist: &PlaylistRef,
        fields: &FieldSelection,
        offset: u32,
        count: Option<u32>,
    ) -> Result<PlaylistItemsSnapshot> {
        let params = [
            ("playlistItems", bool_param(true)),
            ("plref", playlist.to_string()),
            ("plrange", format!("{}:{}", offset, count.unwrap_or(UNBOUNDED_COUNT))),
            ("plcolumns", fields.query_value()),
        ];
        let response = self.request(Endpoint::Query, &params, &[], None).await?;
        PlaylistItemsSnapshot::from_fragment(fragment(&response, "playlistItems")?, fields)
    }

    pub async fn set_current_playlist(&self, playlist: &PlaylistRef) -> Result<()> {
        let params = [("current", playlist.to_string())];
        self.request(Endpoint::SetCurrentPlaylist, &params, &[], None).await.map(drop)
    }

    /// Create a playlist and look it up again by title
    ///
    /// The lookup takes the last playlist with that title, so a concurrent
    /// edit on the server can make it return a different playlist.
    pub async fn add_playlist(&self, title: &str, index: Option<u32>) -> Result<Option<PlaylistInfo>> {
        let mut params = vec![("title", title.to_string())];
        if let Some(index) = index {
            params.push(("index", index.to_string()));
        }
        self.request(Endpoint::AddPlaylist, &params, &[], None).await?;
        self.find_playlist(Some(title), None, true).await
    }

    pub async fn rename_playlist(&self, playlist: &PlaylistRef, title: &str) -> Result<()> {
        let params = [("title", title.to_string())];
        let path_params = [("playlist_ref", playlist.to_string())];
        self.request(Endpoint::UpdatePlaylist, &params, &path_params, None).await.map(drop)
    }

    pub async fn remove_playlist(&self, playlist: &PlaylistRef) -> Result<()> {
        let path_params = [("playlist_ref", playlist.to_string())];
        self.request(Endpoint::RemovePlaylist, &[], &path_params, None).await.map(drop)
    }

    pub async fn move_playlist(&self, playlist: &PlaylistRef, new_index: u32) -> Result<()> {
        let path_params = [
            ("playlist_ref", playlist.to_string()),
            ("new_index", new_index.to_string()),
        ];
        self.request(Endpoint::MovePlaylist, &[], &path_params, None).await.map(drop)
    }

    pub async fn clear_playlist(&self, playlist: &PlaylistRef) -> Result<()> {
        let path_params = [("playlist_ref", playlist.to_string())];
        self.request(Endpoint::ClearPlaylist, &[], &path_params, None).await.map(drop)
    }

    // Playlist items

    /// Add files or directories by path
    ///
    /// With `asynchronous` the server returns before it has finished
    /// reading the added items.
    pub async fn add_playlist_items<S: AsRef<str>>(
        &self,
        playlist: &PlaylistRef,
        paths: &[S],
        index: Option<u32>,
        asynchronous: bool,
    ) -> Result<()> {
        let mut params = vec![("async", bool_param(asynchronous))];
        if let Some(index) = index {
            params.push(("index", index.to_string()));
        }
        let path_params = [("playlist_ref", playlist.to_string())];
        let items: Vec<&str> = paths.iter().map(|path| path.as_ref()).collect();
        let body = json!({ "items": items });
        self.request(Endpoint::AddPlaylistItems, &params, &path_params, Some(&body))
            .await
            .map(drop)
    }

    pub async fn copy_playlist_items(
        &self,
        playlist: &PlaylistRef,
        items: &[u32],
        target_index: Option<u32>,
    ) -> Result<()> {
        self.transfer_items(Endpoint::CopyPlaylistItems, &[("playlist_ref", playlist.to_string())], items, target_index)
            .await
    }

    pub async fn move_playlist_items(
        &self,
        playlist: &PlaylistRef,
        items: &[u32],
        target_index: Option<u32>,
    ) -> Result<()> {
        self.transfer_items(Endpoint::MovePlaylistItems, &[("playlist_ref", playlist.to_string())], items, target_index)
            .await
    }

    pub async fn copy_playlist_items_between(
        &self,
        source: &PlaylistRef,
        dest: &PlaylistRef,
        items: &[u32],
        target_index: Option<u32>,
    ) -> Result<()> {
        let path_params = [
            ("source_playlist_ref", source.to_string()),
            ("dest_playlist_ref", dest.to_string()),
        ];
        self.transfer_items(Endpoint::CopyBetweenPlaylists, &path_params, items, target_index)
            .await
    }

    pub async fn move_playlist_items_between(
        &self,
        source: &PlaylistRef,
        dest: &PlaylistRef,
        items: &[u32],
        target_index: Option<u32>,
    ) -> Result<()> {
        let path_params = [
            ("source_playlist_ref", source.to_string()),
            ("dest_playlist_ref", dest.to_string()),
        ];
        self.transfer_items(Endpoint::MoveBetweenPlaylists, &path_params, items, target_index)
            .await
    }

    async fn transfer_items(
        &self,
        endpoint: Endpoint,
        path_params: &[(&str, String)],
        items: &[u32],
        target_index: Option<u32>,
    ) -> Result<()> {
        let params: Vec<(&str, String)> = target_index
            .map(|index| ("targetIndex", index.to_string()))
            .into_iter()
            .collect();
        let body = json!({ "items": items });
        self.request(endpoint, &params, path_params, Some(&body)).await.map(drop)
    }

    pub async fn remove_playlist_items(&self, playlist: &PlaylistRef, items: &[u32]) -> Result<()> {
        let path_params = [("playlist_ref", playlist.to_string())];
        let body = json!({ "items": items });
        self.request(Endpoint::RemovePlaylistItems, &[], &path_params, Some(&body))
            .await
            .map(drop)
    }

    /// Sort by a title-format expression such as `%title%`
    pub async fn sort_playlist_items(
        &self,
        playlist: &PlaylistRef,
        by: &str,
        descending: bool,
        random: bool,
    ) -> Result<()> {
        let params = [
            ("by", by.to_string()),
            ("desc", bool_param(descending)),
            ("random", bool_param(random)),
        ];
        let path_params = [("playlist_ref", playlist.to_string())];
        self.request(Endpoint::SortPlaylistItems, &params, &path_params, None)
            .await
            .map(drop)
    }

    // Browsing

    pub async fn get_browser_roots(&self) -> Result<BrowserEntries> {
        let response = self.request(Endpoint::BrowserRoots, &[], &[], None).await?;
        BrowserEntries::from_response(&response.unwrap_or(Value::Null))
    }

    pub async fn get_browser_entries(&self, path: &str) -> Result<BrowserEntries> {
        let params = [("path", path.to_string())];
        let response = self.request(Endpoint::BrowserEntries, &params, &[], None).await?;
        BrowserEntries::from_response(&response.unwrap_or(Value::Null))
    }

    /// Raw image bytes of an item's artwork
    pub async fn get_artwork(&self, playlist: &PlaylistRef, index: u32) -> Result<Bytes> {
        let path_params = [("playlist_ref", playlist.to_string()), ("index", index.to_string())];
        let response = self.send(Endpoint::Artwork, &[], &path_params, None).await?;
        Ok(response.bytes().await?)
    }
}
