use reqwest::StatusCode;
use thiserror::Error;

/// Message used when the backend gives no usable `message` field.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Substring the backend uses when a deployment is already running or done.
const NOT_STARTABLE: &str = "cannot be started";

/// Failure of a single backend call. `Display` is the human-readable message
/// shown in the dashboard.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    /// 2xx response whose envelope carried `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn backend(status: StatusCode, message: Option<String>) -> Self {
        Self::Backend {
            status,
            message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// True for the benign conflict returned when starting a deployment that
    /// is already started.
    pub fn is_not_startable(&self) -> bool {
        self.to_string().to_lowercase().contains(NOT_STARTABLE)
    }
}
