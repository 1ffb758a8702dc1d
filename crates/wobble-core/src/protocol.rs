//! JSON-RPC 2.0 wire types for the Wobble API.
//!
//! The API endpoint accepts one JSON object per HTTP POST and answers with one
//! JSON object. Parameters are always sent by name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version sent with every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Named parameters of a remote call.
pub type Params = Map<String, Value>;

/// A request to the Wobble API.
///
/// Request format:
/// ```json
/// {"jsonrpc": "2.0", "id": "uuid", "method": "...", "params": {...}}
/// ```
#[derive(Debug, Serialize)]
pub struct Request {
    /// Protocol version (always "2.0")
    pub jsonrpc: &'static str,
    /// Unique request identifier (echoed in response)
    pub id: String,
    /// Remote procedure name (e.g., "user_login", "topic_set_archived")
    pub method: String,
    /// Named parameters (empty object `{}` if none)
    pub params: Params,
}

impl Request {
    /// Create a new request with the given method and named parameters.
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            method: method.into(),
            params,
        }
    }

    /// Create a request with no parameters.
    pub fn no_params(method: impl Into<String>) -> Self {
        Self::new(method, Params::new())
    }
}

/// A response from the Wobble API.
///
/// Response format:
/// ```json
/// {"jsonrpc": "2.0", "id": "uuid", "result": ..., "error": null}
/// ```
#[derive(Debug, Deserialize)]
pub struct Response {
    /// Protocol version (older servers omit it)
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Echo of the request id
    #[serde(default)]
    pub id: Option<Value>,
    /// Result payload (present on success, may be `null`)
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    /// Error payload (present on failure)
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// Split the response into its result or its error object.
    ///
    /// Returns `None` when the response carries neither.
    pub fn into_outcome(self) -> Option<Result<Value, RpcError>> {
        match (self.result, self.error) {
            (_, Some(error)) => Some(Err(error)),
            (Some(result), None) => Some(Ok(result)),
            (None, None) => None,
        }
    }
}

// Keeps an explicit `"result": null` distinct from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error object returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcError {
    /// Error code (e.g., -32601 for an unknown method)
    pub code: i64,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Raw JSON text of the most recent exchange on a transport.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Last request body sent
    pub request: Option<String>,
    /// Last response body received
    pub response: Option<String>,
}

impl History {
    /// Method name of the last outgoing request, if it can be recovered.
    pub fn last_method(&self) -> Option<String> {
        let request = self.request.as_deref()?;
        let value: Value = serde_json::from_str(request).ok()?;
        value.get("method")?.as_str().map(str::to_string)
    }

    /// Forget the recorded exchange.
    pub fn clear(&mut self) {
        self.request = None;
        self.response = None;
    }
}
