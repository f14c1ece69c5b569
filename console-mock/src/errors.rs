//! Error type shared by every handler.
//!
//! All failures carry an [`ErrorKind`] and a human readable message. The kind decides the HTTP
//! status and becomes the `error_code` of the JSON body, mirroring the error envelope of the real
//! API:
//!
//! ```json
//! { "error_code": "Forbidden", "message": "action not authorized", "request_id": "…" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;
use utoipa::ToSchema;
use uuid::Uuid;

/// Machine readable error category, serialized as the `error_code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    InvalidRequest,
    ObjectAlreadyExists,
    ServiceUnavailable,
    NotImplemented,
    InternalError,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            // The real API reports duplicates as a client error rather than 409
            ErrorKind::ObjectAlreadyExists => StatusCode::BAD_REQUEST,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The caller lacks a sufficient role on the resource
    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden, "action not authorized")
    }

    pub fn not_found(resource: &str, key: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("not found: {resource} with name or id \"{key}\""))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn already_exists(resource: &str, name: &str) -> Self {
        Self::new(ErrorKind::ObjectAlreadyExists, format!("already exists: {resource} \"{name}\""))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Message safe to return to clients. Internal failures are not described.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::InternalError => "Internal Server Error".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error_code: ErrorKind,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.kind {
            ErrorKind::InternalError => tracing::error!("Internal error: {}", self.message),
            ErrorKind::ServiceUnavailable | ErrorKind::NotImplemented => tracing::warn!("Unavailable: {}", self),
            ErrorKind::Forbidden => tracing::info!("Authorization error: {}", self),
            _ => tracing::debug!("Client error: {}", self),
        }

        let body = ErrorBody {
            error_code: self.kind,
            message: self.user_message(),
            request_id: Uuid::new_v4().to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::internal(format!("{err:#}"))
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
