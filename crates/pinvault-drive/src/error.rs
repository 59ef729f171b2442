//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, DriveError>;

/// Drive client errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Drive API error
    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token endpoint rejected the assertion
    #[error("Token exchange failed ({status}): {message}")]
    Token { status: u16, message: String },

    /// Missing or malformed service-account key
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// JWT signing error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl DriveError {
    /// Build an API error from a Drive error response body
    ///
    /// Drive answers with `{"error": {"code": 404, "message": "..."}}`; anything
    /// else is kept verbatim (truncated).
    pub fn from_api_body(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
            Err(_) => body.chars().take(512).collect(),
        };
        Self::Api { status, message }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if the error came from credentials rather than the API
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Credentials(_) | Self::Jwt(_) | Self::Token { .. })
            || matches!(self, Self::Api { status: 401 | 403, .. })
    }
}
