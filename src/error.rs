use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The inbound command envelope could not be decoded.
    #[error("XHR decoding failed: {0}")]
    Decode(String),

    /// A session token was absent, malformed, forged or expired.
    #[error("Invalid session token")]
    InvalidToken,

    /// A session token payload could not be serialized.
    #[error("Token encoding error: {0}")]
    Encoding(String),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Unknown user id or wrong secret at login.
    #[error("{0}")]
    CredentialMismatch(String),

    /// The external document store failed. The message is surfaced verbatim.
    #[error("{0}")]
    Collaborator(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Decode(ref msg) => {
                tracing::debug!("Decode error: {}", msg);
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            AppError::InvalidToken => {
                tracing::warn!("Invalid session token");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::Encoding(ref msg) => {
                tracing::error!("Token encoding error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encoding error".to_string())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::CredentialMismatch(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Collaborator(ref msg) => {
                tracing::error!("Document store error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }

            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "File system error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
