//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and the single place
//! where failures are translated into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coursehub_core::{PortError, ThreadError};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(String),

    /// An identifier that is malformed or does not point at anything inside the aggregate.
    #[error("{0}")]
    InvalidId(String),

    #[error("Please login to access this resource")]
    Unauthenticated,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Could not refresh token")]
    InvalidRefreshToken,

    #[error("Session expired, please login to access this resource")]
    SessionExpired,

    #[error("Invalid activation code")]
    CodeMismatch,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A mail relay or image host failure. The status depends on the call site.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn upstream(status: StatusCode, err: impl std::fmt::Display) -> Self {
        ApiError::Upstream {
            status,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidId(_)
            | ApiError::Unauthenticated
            | ApiError::InvalidToken
            | ApiError::InvalidRefreshToken
            | ApiError::SessionExpired
            | ApiError::CodeMismatch
            | ApiError::InvalidCredentials
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) | ApiError::Port(PortError::Unauthorized) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Port(PortError::Unexpected(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migrate(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client. Unclassified failures never leak details.
    fn public_message(&self) -> String {
        match self {
            ApiError::Port(PortError::NotFound(what)) => format!("Resource not found: {what}"),
            ApiError::Port(PortError::Conflict(what)) => format!("Duplicate {what} entered"),
            ApiError::Port(PortError::Unauthorized) => ApiError::Unauthenticated.to_string(),
            _ if self.status() == StatusCode::INTERNAL_SERVER_ERROR
                && !matches!(self, ApiError::Upstream { .. }) =>
            {
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<ThreadError> for ApiError {
    fn from(err: ThreadError) -> Self {
        ApiError::InvalidId(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) | TokenError::Expired => ApiError::InvalidToken,
            TokenError::CodeMismatch => ApiError::CodeMismatch,
            TokenError::Signing(e) => ApiError::Internal(e),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::InvalidId(format!("Resources not found. Invalid id: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }
        let body = json!({
            "success": false,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_bad_requests() {
        for err in [
            ApiError::Unauthenticated,
            ApiError::InvalidToken,
            ApiError::InvalidRefreshToken,
            ApiError::SessionExpired,
            ApiError::CodeMismatch,
            ApiError::InvalidCredentials,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(ApiError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn persistence_shapes_are_rewritten() {
        let conflict = ApiError::from(PortError::Conflict("email".into()));
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(conflict.public_message(), "Duplicate email entered");

        let missing = ApiError::from(PortError::NotFound("course".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let cast = ApiError::from(uuid::Uuid::parse_str("nope").unwrap_err());
        assert_eq!(cast.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::Port(PortError::Unexpected("connection refused on 10.0.0.3".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");

        let mail = ApiError::upstream(StatusCode::INTERNAL_SERVER_ERROR, "smtp down");
        assert_eq!(mail.public_message(), "smtp down");
    }

    #[test]
    fn thread_errors_become_invalid_id() {
        let err = ApiError::from(ThreadError::InvalidQuestionId);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid questionId");
    }
}
