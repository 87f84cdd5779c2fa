use reqwest::Method;

use crate::error::{ApiError, Result};

/// Prefix shared by every beefweb route
pub const API_PREFIX: &str = "/api";

/// The routes exposed by the beefweb plugin
///
/// Each route maps to an HTTP method and a path template below [`API_PREFIX`].
/// Templates may contain `{name}` placeholders filled from path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetPlayerState,
    SetPlayerState,
    Play,
    PlaySpecific,
    PlayRandom,
    PlayNext,
    PlayPrevious,
    Stop,
    Pause,
    PauseToggle,

    /// `GET /query`, used for both playlist listings and item windows
    Query,
    /// `GET /query/updates`, the server-sent event stream
    QueryUpdates,

    SetCurrentPlaylist,
    AddPlaylist,
    UpdatePlaylist,
    RemovePlaylist,
    MovePlaylist,
    ClearPlaylist,

    AddPlaylistItems,
    CopyPlaylistItems,
    MovePlaylistItems,
    CopyBetweenPlaylists,
    MoveBetweenPlaylists,
    RemovePlaylistItems,
    SortPlaylistItems,

    BrowserRoots,
    BrowserEntries,
    Artwork,
}

/// Method and path template for an [`Endpoint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub fn info(&self) -> EndpointInfo {
        let (method, path) = match self {
            Endpoint::GetPlayerState => (Method::GET, "/player"),
            Endpoint::SetPlayerState => (Method::POST, "/player"),
            Endpoint::Play => (Method::POST, "/player/play"),
            Endpoint::PlaySpecific => (Method::POST, "/player/play/{playlist_ref}/{index}"),
            Endpoint::PlayRandom => (Method::POST, "/player/play/random"),
            Endpoint::PlayNext => (Method::POST, "/player/next"),
            Endpoint::PlayPrevious => (Method::POST, "/player/previous"),
            Endpoint::Stop => (Method::POST, "/player/stop"),
            Endpoint::Pause => (Method::POST, "/player/pause"),
            Endpoint::PauseToggle => (Method::POST, "/player/pause/toggle"),
            Endpoint::Query => (Method::GET, "/query"),
            Endpoint::QueryUpdates => (Method::GET, "/query/updates"),
            Endpoint::SetCurrentPlaylist => (Method::POST, "/playlists"),
            Endpoint::AddPlaylist => (Method::POST, "/playlists/add"),
            Endpoint::UpdatePlaylist => (Method::POST, "/playlists/{playlist_ref}"),
            Endpoint::RemovePlaylist => (Method::POST, "/playlists/remove/{playlist_ref}"),
            Endpoint::MovePlaylist => (Method::POST, "/playlists/move/{playlist_ref}/{new_index}"),
            Endpoint::ClearPlaylist => (Method::POST, "/playlists/{playlist_ref}/clear"),
            Endpoint::AddPlaylistItems => (Method::POST, "/playlists/{playlist_ref}/items/add"),
            Endpoint::CopyPlaylistItems => (Method::POST, "/playlists/{playlist_ref}/items/copy"),
            Endpoint::MovePlaylistItems => (Method::POST, "/playlists/{playlist_ref}/items/move"),
            Endpoint::CopyBetweenPlaylists => {
                (Method::POST, "/playlists/{source_playlist_ref}/{dest_playlist_ref}/items/copy")
            }
            Endpoint::MoveBetweenPlaylists => {
                (Method::POST, "/playlists/{source_playlist_ref}/{dest_playlist_ref}/items/move")
            }
            Endpoint::RemovePlaylistItems => (Method::POST, "/playlists/{playlist_ref}/items/remove"),
            Endpoint::SortPlaylistItems => (Method::POST, "/playlists/{playlist_ref}/items/sort"),
            Endpoint::BrowserRoots => (Method::GET, "/browser/roots"),
            Endpoint::BrowserEntries => (Method::GET, "/browser/entries"),
            Endpoint::Artwork => (Method::GET, "/artwork/{playlist_ref}/{index}"),
        };
        EndpointInfo { method, path }
    }

    pub fn method(&self) -> Method {
        self.info().method
    }

    /// Full path below the server root, placeholders filled in
    ///
    /// Every placeholder must be supplied; leftovers are an
    /// `InvalidParameter` error.
    pub fn render_path(&self, path_params: &[(&str, String)]) -> Result<String> {
        let mut path = format!("{API_PREFIX}{}", self.info().path);
        for (name, value) in path_params {
            path = path.replace(&format!("{{{name}}}"), value);
        }

        if let Some(start) = path.find('{') {
            let missing = path[start..].split('}').next().unwrap_or_default();
            return Err(ApiError::InvalidParameter(format!(
                "missing path parameter {missing}}} for {self:?}"
            )));
        }
        Ok(path)
    }
}
