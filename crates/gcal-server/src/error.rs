//! Broker error types.

use std::io;
use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gcal_protocol::{AUTHENTICATION_FAILED, ErrorBody, INVALID_CREDENTIALS};
use gcal_providers::ProviderError;
use thiserror::Error;

use crate::exchange::ExchangeError;

/// Result type for broker startup and serving.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the broker process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("cannot resolve {field}: {message}")]
    Secret { field: String, message: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn secret(field: &str, message: impl Into<String>) -> Self {
        Self::Secret {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A failed request, rendered as `{"message": ...}` with a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
    }

    /// Maps an upstream failure on a pass-through route: 401 stays 401,
    /// anything else becomes 400 with `fallback` or the upstream message.
    pub fn from_upstream(err: &ProviderError, fallback: Option<&str>) -> Self {
        if err.is_unauthorized() {
            return Self::unauthorized();
        }
        Self::bad_request(fallback.unwrap_or(err.message()))
    }
}

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Validation(message) => Self::bad_request(message),
            ExchangeError::AuthenticationFailed => {
                Self::new(StatusCode::FORBIDDEN, AUTHENTICATION_FAILED)
            }
            ExchangeError::Unavailable(message) => Self::bad_request(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}
