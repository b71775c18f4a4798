//! Normalized error type for the task API client.
//!
//! # Design
//! Every failure collapses into one shape, distinguished only by variant:
//! the server answered with a non-2xx status, the request went out but no
//! response came back, or the request could not be constructed at all.
//! Variants carry owned data only, so the store can retain the last error
//! in shared state while also returning it to the caller.

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the transport, API client, and store.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server responded with a non-2xx status. `message` comes from the
    /// body's `message` field when present; `data` is the raw decoded body.
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        data: Value,
    },

    /// The request was sent but no response arrived (connect failure or
    /// timeout).
    #[error("Network error - please check your connection")]
    Network,

    /// The request could not be constructed or handed to the transport.
    #[error("{message}")]
    Client { message: String },
}

impl ApiError {
    /// HTTP status for server errors; `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Server { status, .. } => *status,
            ApiError::Network | ApiError::Client { .. } => 0,
        }
    }

    /// Raw response body for server errors.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Server { data, .. } => Some(data),
            _ => None,
        }
    }

    pub(crate) fn server(status: u16, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "An error occurred".to_string());
        ApiError::Server {
            status,
            message,
            data: body,
        }
    }

    pub(crate) fn client(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        ApiError::Client {
            message: if message.is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                message
            },
        }
    }
}

/// Result alias used throughout the crate.
pub type ApiResult<T> = Result<T, ApiError>;
