//! JSON-RPC envelope types and the wire error-code taxonomy.
//!
//! Every crate's own error type is kept free of wire concerns; the Dispatcher
//! and the transport are the only places that fold internal errors down into
//! an [`RpcError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request id, carried opaquely between request and response.
pub type RequestId = Value;

/// A JSON-RPC request as accepted by the Dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol marker; accepted but not required on input.
    #[serde(default, rename = "jsonrpc", skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Name of the operation to invoke.
    pub method: String,
    /// Parameters keyed by declared parameter name.
    #[serde(default)]
    pub params: Value,
    /// Caller-supplied correlation id, echoed back verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl RpcRequest {
    /// Builds a request with no id, the form used for fire-and-forget and
    /// scheduler-synthesized self calls.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: None,
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Returns the params as an object map, or an empty map if params is not
    /// an object (e.g. `null` on an argument-less call).
    #[must_use]
    pub fn params_object(&self) -> serde_json::Map<String, Value> {
        match &self.params {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        }
    }
}

/// A JSON-RPC response: exactly one of `result` or `error` is present.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    /// Echoes the request id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl RpcResponse {
    /// Builds a success response, used for both non-void results and the
    /// null result void operations produce.
    #[must_use]
    pub fn ok(result: Value, id: Option<RequestId>) -> Self {
        Self {
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Builds a failure response.
    #[must_use]
    pub fn err(error: RpcError, id: Option<RequestId>) -> Self {
        Self {
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// The error object carried in a failed [`RpcResponse`].
#[derive(Clone, Debug, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({code})")]
pub struct RpcError {
    /// Numeric or named error code; see [`RpcErrorCode`].
    pub code: i64,
    /// Human-readable message; never leaks internal detail for
    /// authorization failures.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Builds an error from a [`RpcErrorCode`] and message.
    #[must_use]
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_i64(),
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured error detail.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The wire error-code taxonomy. The first five mirror JSON-RPC 2.0's
/// reserved range; the rest are this runtime's own domain codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RpcErrorCode {
    /// Malformed JSON in the request body.
    ParseError,
    /// Request envelope was structurally invalid.
    InvalidRequest,
    /// No operation with the requested name is exposed.
    MethodNotFound,
    /// A required parameter was missing or failed to coerce.
    InvalidParams,
    /// An unclassified failure occurred while executing the operation.
    InternalError,
    /// The configured authorizor rejected the call.
    NotAuthorized,
    /// The target agent id has no registered entry.
    NotFound,
    /// A synchronous `send` exceeded its deadline.
    Timeout,
}

impl RpcErrorCode {
    /// Maps to the numeric/reserved code used on the wire.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            // The domain codes are not part of the JSON-RPC 2.0 reserved
            // range; negative values outside that range keep them easy to
            // tell apart from the five above without colliding.
            Self::NotAuthorized => -32001,
            Self::NotFound => -32002,
            Self::Timeout => -32003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_without_params_object_yields_empty_map() {
        let request = RpcRequest::new("ping", Value::Null);
        assert!(request.params_object().is_empty());
    }

    #[test]
    fn response_serializes_result_xor_error() {
        let ok = RpcResponse::ok(Value::String("hi".into()), Some(Value::from(1)));
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("result").is_some());
        assert!(json.get("error").is_none());

        let err = RpcResponse::err(
            RpcError::new(RpcErrorCode::InvalidParams, "missing message"),
            Some(Value::from(2)),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("error").is_some());
        assert!(json.get("result").is_none());
    }

    #[test]
    fn error_codes_match_json_rpc_reserved_range() {
        assert_eq!(RpcErrorCode::ParseError.as_i64(), -32700);
        assert_eq!(RpcErrorCode::InvalidParams.as_i64(), -32602);
    }
}
