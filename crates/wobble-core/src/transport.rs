//! Transports that carry JSON-RPC calls to the Wobble API.
//!
//! `WobbleService` only talks to the [`Transport`] trait, so tests and other
//! front ends can swap in their own implementation.

use thiserror::Error;
use tracing::trace;

use crate::protocol::{History, Params, Request, Response, RpcError};

/// Errors that can occur while talking to the API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Empty response from server")]
    EmptyResponse,

    #[error("Remote error {}: {}", .0.code, .0.message)]
    Remote(RpcError),

    #[error("Response carries neither result nor error")]
    MalformedResponse,
}

impl TransportError {
    /// Whether the server answered but the exchange broke the protocol.
    ///
    /// Connection and serialization failures never reached the API and are
    /// not protocol errors.
    pub fn is_protocol(&self) -> bool {
        !matches!(
            self,
            TransportError::Connection(_) | TransportError::Serialize(_)
        )
    }
}

/// A channel that performs named remote procedure calls.
pub trait Transport {
    /// Invoke `method` with named `params` and return the decoded result.
    fn call(&mut self, method: &str, params: Params) -> Result<serde_json::Value, TransportError>;

    /// The most recent exchange, for error reporting.
    ///
    /// Every `call` must replace the history before it returns: a call that
    /// records nothing leaves it empty, never holding an earlier request.
    /// `WobbleService` names the failing method from `history().request`.
    fn history(&self) -> &History;
}

/// JSON-RPC over blocking HTTP POST.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
    history: History,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::blocking::Client::new())
    }

    /// Create a transport with a preconfigured HTTP client (proxies, TLS, ...).
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
            history: History::default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode(body: &str) -> Result<serde_json::Value, TransportError> {
        if body.trim().is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        let response: Response = serde_json::from_str(body).map_err(TransportError::Parse)?;
        match response.into_outcome() {
            Some(Ok(result)) => Ok(result),
            Some(Err(error)) => Err(TransportError::Remote(error)),
            None => Err(TransportError::MalformedResponse),
        }
    }
}

impl Transport for HttpTransport {
    fn call(&mut self, method: &str, params: Params) -> Result<serde_json::Value, TransportError> {
        self.history.clear();

        let request = Request::new(method, params);
        let json = serde_json::to_string(&request).map_err(TransportError::Serialize)?;
        self.history.request = Some(json.clone());
        trace!(endpoint = %self.endpoint, request = %json, "sending request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .map_err(TransportError::Connection)?;

        let status = response.status();
        let body = response.text().map_err(TransportError::Connection)?;
        trace!(status = status.as_u16(), response = %body, "received response");
        self.history.response = Some(body.clone());

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Self::decode(&body)
    }

    fn history(&self) -> &History {
        &self.history
    }
}
