//! Client error types.
//!
//! Each rejected-request status the engine uses (400/404/409/422) has its own
//! variant so the UI can prefix the message consistently.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Unprocessable(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Connection failed: {0}")]
    Transport(String),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Malformed quote for {ticker}: field {field} = {value:?}")]
    MalformedQuote {
        ticker: String,
        field: String,
        value: String,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-2xx response to an error.
    ///
    /// `detail` is the server-provided explanation when the body could be
    /// decoded; otherwise the canonical status text is used.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        let message = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown status").to_string());

        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Unprocessable(message),
            other => Self::Http {
                status: other.as_u16(),
                message,
            },
        }
    }

    /// True for connectivity failures (request never got a response).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True when the server rejected the request with a decodable reason.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_) | Self::NotFound(_) | Self::Conflict(_) | Self::Unprocessable(_)
        )
    }

    /// True for per-item data problems that should render as a placeholder.
    pub fn is_malformed_data(&self) -> bool {
        matches!(
            self,
            Self::MalformedQuote { .. } | Self::Decode { .. } | Self::Json(_)
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
