//! Error types for beefweb-state

use std::fmt;

use beefweb_api::ApiError;
use beefweb_stream::StreamError;

/// Result type for beefweb-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur while configuring or driving a listener
#[derive(Debug)]
pub enum StateError {
    /// Caller misuse, such as an unknown update class name
    UsageError(String),

    /// Invalid listener configuration
    ConfigurationError(String),

    /// Error from beefweb-api
    Api(ApiError),

    /// Error from beefweb-stream
    Stream(StreamError),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::UsageError(msg) => write!(f, "Usage error: {}", msg),
            StateError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            StateError::Api(err) => write!(f, "API error: {}", err),
            StateError::Stream(err) => write!(f, "Stream error: {}", err),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Api(err) => Some(err),
            StateError::Stream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for StateError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::UsageError(msg) => StateError::UsageError(msg),
            other => StateError::Api(other),
        }
    }
}

impl From<StreamError> for StateError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::UnknownUpdateClass(name) => {
                StateError::UsageError(format!("unknown update class '{}'", name))
            }
            StreamError::ConfigurationError(msg) => StateError::ConfigurationError(msg),
            other => StateError::Stream(other),
        }
    }
}
