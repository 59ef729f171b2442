//! Error types and JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pinvault_drive::DriveError;
use thiserror::Error;

/// Error codes returned by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PinRequired,
    IncorrectPin,
    FileRequired,
    InvalidRequest,
    NotInLockedFolder,
    SlowDown,
    InternalError,
}

impl ErrorCode {
    /// Get the error code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PinRequired => "PinRequired",
            Self::IncorrectPin => "IncorrectPin",
            Self::FileRequired => "FileRequired",
            Self::InvalidRequest => "InvalidRequest",
            Self::NotInLockedFolder => "NotInLockedFolder",
            Self::SlowDown => "SlowDown",
            Self::InternalError => "InternalError",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PinRequired | Self::FileRequired | Self::InvalidRequest => {
                StatusCode::BAD_REQUEST
            }
            Self::IncorrectPin => StatusCode::UNAUTHORIZED,
            Self::NotInLockedFolder => StatusCode::FORBIDDEN,
            Self::SlowDown => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers
    pub fn message(&self) -> &'static str {
        match self {
            Self::PinRequired => "PIN is required",
            Self::IncorrectPin => "Incorrect PIN",
            Self::FileRequired => "File is required (field name: file)",
            Self::InvalidRequest => "Invalid request",
            Self::NotInLockedFolder => "File is not in the locked folder",
            Self::SlowDown => "Too many requests, please slow down",
            Self::InternalError => "Internal error",
        }
    }
}

/// Folder relay operation, used to word upstream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Upload,
    Download,
}

impl Operation {
    /// Generic message returned when the provider fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::List => "Internal error listing files",
            Self::Upload => "Internal error uploading file",
            Self::Download => "Internal error downloading file",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::List => "listing files",
            Self::Upload => "uploading file",
            Self::Download => "downloading file",
        })
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller-side problem with a known code
    #[error("{code:?}: {message}")]
    Request { code: ErrorCode, message: String },

    /// Drive call failed; details are logged, never returned
    #[error("Drive error while {operation}: {source}")]
    Upstream {
        operation: Operation,
        #[source]
        source: DriveError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create an error with the code's standard message
    pub fn new(code: ErrorCode) -> Self {
        Self::Request {
            code,
            message: code.message().to_string(),
        }
    }

    /// Create an error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Request {
            code,
            message: message.into(),
        }
    }

    /// Wrap a provider failure
    pub fn upstream(operation: Operation, source: DriveError) -> Self {
        Self::Upstream { operation, source }
    }

    /// Build a `map_err` adapter for a relay operation
    pub fn upstream_for(operation: Operation) -> impl Fn(DriveError) -> Self {
        move |source| Self::upstream(operation, source)
    }

    /// Get the error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Request { code, .. } => *code,
            Self::Upstream { .. } | Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> &str {
        match self {
            Self::Request { message, .. } => message,
            Self::Upstream { operation, .. } => operation.failure_message(),
            Self::Internal(_) => ErrorCode::InternalError.message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    cause = upstream_cause(source),
                    error = %source,
                    "Drive request failed"
                );
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
            }
            Self::Request { code, .. } => {
                tracing::debug!(code = code.as_str(), "Request rejected");
            }
        }

        let status = self.error_code().status_code();
        let body = serde_json::json!({ "error": self.public_message() });

        (status, Json(body)).into_response()
    }
}

/// Coarse class of a provider failure, for operators reading the logs
fn upstream_cause(source: &DriveError) -> &'static str {
    if source.is_auth_error() {
        "credentials"
    } else if source.is_not_found() {
        "not_found"
    } else {
        "provider"
    }
}
