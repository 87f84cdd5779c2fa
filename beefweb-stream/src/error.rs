//! Error types for the beefweb-stream crate.

use beefweb_api::ApiError;

/// Errors raised while subscribing to and reading the event stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A streamed message could not be parsed
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// The connection dropped, errored or was refused
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The subscription endpoint could not be built
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// An update class name outside player_state, playlist_items, playlists
    #[error("Unknown update class: {0}")]
    UnknownUpdateClass(String),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Nobody is listening for channel events any more
    #[error("Event receiver dropped")]
    ReceiverDropped,
}

impl From<std::io::Error> for StreamError {
    fn from(error: std::io::Error) -> Self {
        StreamError::TransportFailure(error.to_string())
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(error: reqwest::Error) -> Self {
        StreamError::TransportFailure(error.to_string())
    }
}

impl From<ApiError> for StreamError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::NetworkError(msg) => StreamError::TransportFailure(msg),
            ApiError::ParseError(msg) | ApiError::MalformedPayload(msg) => StreamError::DecodeFailure(msg),
            ApiError::InvalidParameter(msg) | ApiError::UsageError(msg) => StreamError::InvalidEndpoint(msg),
            other => StreamError::TransportFailure(other.to_string()),
        }
    }
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
