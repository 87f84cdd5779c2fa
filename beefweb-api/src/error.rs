use thiserror::Error;

/// Errors raised by the beefweb data model and request client
///
/// The request client maps transport and HTTP status problems onto
/// `NetworkError` and `RequestFailed`, while the snapshot builders report
/// structurally incomplete payloads as `MalformedPayload`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// The server could not be reached, the connection dropped, or the
    /// request timed out before a response arrived.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered with a status other than 200 or 204
    ///
    /// `body` holds the response text, which beefweb usually fills with a
    /// JSON object describing the failure.
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Response parsing error
    ///
    /// The response arrived but was not valid JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A present update fragment lacks required structure
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller used the API incorrectly, e.g. a duplicate field name
    #[error("Usage error: {0}")]
    UsageError(String),
}

impl ApiError {
    /// Build a `MalformedPayload` error naming the fragment that failed
    pub fn malformed(fragment: &str, detail: impl std::fmt::Display) -> Self {
        Self::MalformedPayload(format!("{fragment}: {detail}"))
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::ParseError(error.to_string())
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(error: url::ParseError) -> Self {
        ApiError::InvalidParameter(format!("invalid url: {error}"))
    }
}
