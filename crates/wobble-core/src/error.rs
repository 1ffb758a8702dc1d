//! Error types for the Wobble client.

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, WobbleError>;

/// Message used when the failing method cannot be recovered from history.
pub const GENERIC_PROTOCOL_MESSAGE: &str = "Erroneous Connection to Wobble-API";

#[derive(Error, Debug)]
pub enum WobbleError {
    /// A call that needs a session was made before logging in.
    #[error("Login required: {0}")]
    LoginRequired(String),

    /// The API rejected or garbled a call.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A field the client depends on is absent from a response.
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The request never reached the API.
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    #[error("Config error: {0}")]
    Config(String),
}

impl WobbleError {
    /// Translate a transport failure, naming `method` when it is known.
    pub fn from_transport(err: TransportError, method: Option<String>) -> Self {
        if !err.is_protocol() {
            return WobbleError::Transport(err);
        }

        match method {
            Some(method) => {
                WobbleError::Protocol(format!("Wobble-API does not include Method \"{}\"", method))
            }
            None => WobbleError::Protocol(GENERIC_PROTOCOL_MESSAGE.to_string()),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            WobbleError::LoginRequired(_) => "LOGIN_REQUIRED",
            WobbleError::Protocol(_) => "PROTOCOL_ERROR",
            WobbleError::MissingField(_) => "MISSING_FIELD",
            WobbleError::InvalidParams(_) => "INVALID_PARAMS",
            WobbleError::Transport(_) => "TRANSPORT_ERROR",
            WobbleError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the failure happened on this side of the wire.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WobbleError::LoginRequired(_) | WobbleError::InvalidParams(_) | WobbleError::Config(_)
        )
    }
}
