//! Application error types.
//!
//! Every failure in the workspace is an [`AppError`]. Callers that only care
//! about success can collapse it further; the HTTP layer turns it into an
//! [`ApiResponse`] error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// No session handle is held.
    #[error("not connected to a database server")]
    NotConnected,

    /// Authentication or network failure while opening a session.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// Local validation failed before anything was sent to the server.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A table, column or database name did not pass the allow-list.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The server rejected a statement.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Session missing or could not be established.
    Connection,
    /// Rejected locally, server never saw the statement.
    Validation,
    /// Rejected by the server, or failed after reaching it.
    Server,
}

impl AppError {
    /// Returns the coarse error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotConnected | AppError::DatabaseConnection(_) => ErrorKind::Connection,
            AppError::Validation(_) | AppError::InvalidIdentifier(_) => ErrorKind::Validation,
            AppError::DatabaseQuery(_) | AppError::NotFound(_) | AppError::Internal(_) => {
                ErrorKind::Server
            }
        }
    }

    /// Machine readable error code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::DatabaseConnection(_) => "CONNECTION_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::DatabaseQuery(_) => "QUERY_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseConnection(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) | AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        (status, Json(ApiResponse::err(self.code(), self.to_string()))).into_response()
    }
}
