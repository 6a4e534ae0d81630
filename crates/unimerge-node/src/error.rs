//! Error types for the node boundary.
//!
//! Every non-2xx response carries a JSON envelope `{code, message}`. The
//! `code` is a stable machine-readable class; `message` is the
//! human-readable rendering of the underlying error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use unimerge_engine::Error as EngineError;
use unimerge_protocol::{Role, SessionId};

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed boundary input (bad role token, bad day list, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The negotiation core rejected the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No roster entry for the login id.
    #[error("no {role} is registered under id {login_id}")]
    UnknownLogin { role: Role, login_id: String },

    /// The login id exists but under a different role.
    #[error("{login_id} is not registered as a {requested}")]
    RoleMismatch { login_id: String, requested: Role },

    /// The identity roster could not be read; the protocol never ran.
    #[error("identity roster unavailable: {0}")]
    Connectivity(String),

    /// Slip requested for a session that has not confirmed.
    #[error("session {0} has no confirmed booking")]
    NotConfirmed(SessionId),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable error class for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Engine(EngineError::InvalidRequest(_)) => "INVALID_REQUEST",
            Self::Engine(EngineError::AlreadyNegotiating { .. }) => "ALREADY_NEGOTIATING",
            Self::Engine(EngineError::NotFound(_)) => "NOT_FOUND",
            Self::Engine(EngineError::SessionClosed(_)) => "SESSION_CLOSED",
            Self::Engine(EngineError::InvalidTransition { .. }) => "INTERNAL",
            Self::UnknownLogin { .. } => "UNKNOWN_LOGIN",
            Self::RoleMismatch { .. } => "ROLE_MISMATCH",
            Self::Connectivity(_) => "CONNECTIVITY",
            Self::NotConfirmed(_) => "NOT_CONFIRMED",
            Self::Io(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::AlreadyNegotiating { .. }) => StatusCode::CONFLICT,
            Self::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Engine(EngineError::SessionClosed(_)) => StatusCode::CONFLICT,
            Self::Engine(EngineError::InvalidTransition { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UnknownLogin { .. } => StatusCode::UNAUTHORIZED,
            Self::RoleMismatch { .. } => StatusCode::FORBIDDEN,
            Self::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotConfirmed(_) => StatusCode::CONFLICT,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The `{code, message}` JSON body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {self}");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
