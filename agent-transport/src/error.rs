//! Transport-level errors: failures that never reach the Dispatcher, so
//! they're reported as plain HTTP status + message rather than a JSON-RPC
//! envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A failure in routing the request to an agent, before dispatch ever runs.
#[derive(Debug, Error)]
pub enum TransportHttpError {
    /// The path segment was not a valid agent id.
    #[error("invalid agent id: {0}")]
    BadRequest(String),
    /// No instantiation entry exists for the requested agent.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
}

impl IntoResponse for TransportHttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AgentNotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}
