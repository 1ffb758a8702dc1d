//! Session-aware JSON-RPC client for the Wobble API.
//!
//! [`WobbleService`] logs in once, injects the API key into every call it
//! forwards, and signs out when its [`SessionGuard`] goes out of scope.
//!
//! ```no_run
//! use wobble_core::{WobbleService, DEFAULT_ENDPOINT};
//!
//! # fn main() -> wobble_core::Result<()> {
//! let mut service = WobbleService::new(DEFAULT_ENDPOINT);
//! service.scoped(|svc| {
//!     svc.connect("me@example.com", "secret")?;
//!     svc.archive_topic(42)
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod service;
pub mod transport;

// Re-export commonly used types
pub use config::{ClientConfig, Overrides};
pub use error::{Result, WobbleError};
pub use protocol::{History, Params, Request, Response, RpcError};
pub use service::{SessionGuard, WobbleService, DEFAULT_ENDPOINT};
pub use transport::{HttpTransport, Transport, TransportError};
