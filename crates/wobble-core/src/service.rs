//! `WobbleService`: a session-holding proxy for the Wobble API.
//!
//! Holds the API key obtained at login, injects it into every forwarded call,
//! and turns protocol failures into [`WobbleError::Protocol`]. Remote
//! procedures that have no dedicated method here go through [`WobbleService::call`].

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, WobbleError};
use crate::logging::{log_call, log_secret_call, redact};
use crate::protocol::Params;
use crate::transport::{HttpTransport, Transport};

/// Production API endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://wobble.moinz.de/api/endpoint.php";

const LOGIN_HINT: &str = "Did you forget to call .connect()?";

/// Client for one Wobble API endpoint.
pub struct WobbleService<T: Transport = HttpTransport> {
    endpoint: String,
    transport: T,
    api_key: Option<String>,
    last_notification_timestamp: Option<i64>,
}

impl WobbleService<HttpTransport> {
    /// Create a service talking JSON-RPC over HTTP to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_transport(endpoint, |endpoint| HttpTransport::new(endpoint))
    }
}

impl Default for WobbleService<HttpTransport> {
    /// Service for [`DEFAULT_ENDPOINT`].
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl<T: Transport> WobbleService<T> {
    /// Create a service whose transport is built by `factory` from the endpoint.
    pub fn with_transport<F>(endpoint: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce(&str) -> T,
    {
        let endpoint = endpoint.into();
        let transport = factory(&endpoint);

        Self {
            endpoint,
            transport,
            api_key: None,
            last_notification_timestamp: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Key of the current session, if logged in.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Reserved for notification polling; nothing sets it yet.
    pub fn last_notification_timestamp(&self) -> Option<i64> {
        self.last_notification_timestamp
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Log in and keep the returned API key for later calls.
    pub fn connect(&mut self, user_name: &str, user_password: &str) -> Result<&mut Self> {
        let label = self.to_string();
        log_call(&label, "connect", &(user_name, "***"), || {
            let api_key = self.user_login(user_name, user_password)?;
            self.api_key = Some(api_key);
            Ok::<_, WobbleError>(label.clone())
        })?;

        Ok(self)
    }

    /// Alias for [`connect`](Self::connect).
    pub fn login(&mut self, user_name: &str, user_password: &str) -> Result<&mut Self> {
        self.connect(user_name, user_password)
    }

    /// Exchange credentials for an API key without storing it.
    ///
    /// The email is lower-cased before sending; the password is sent as given.
    pub fn user_login(&mut self, email: &str, password: &str) -> Result<String> {
        let label = self.to_string();
        log_secret_call(&label, "user_login", &(email, "***"), || {
            let mut params = Params::new();
            params.insert("email".to_string(), json!(email.to_lowercase()));
            params.insert("password".to_string(), json!(password));

            let result = self.remote("user_login", params)?;
            result
                .get("apikey")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(WobbleError::MissingField("apikey"))
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fail with [`WobbleError::LoginRequired`] unless logged in.
    pub fn require_login(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| WobbleError::LoginRequired(LOGIN_HINT.to_string()))
    }

    /// Open a scope that signs out when it ends.
    pub fn session(&mut self) -> SessionGuard<'_, T> {
        SessionGuard {
            service: self,
            released: false,
        }
    }

    /// Run `f` inside a session scope.
    ///
    /// Sign-out is attempted after `f` returns or panics; an error from `f` is
    /// returned unchanged even if sign-out fails too.
    pub fn scoped<R, E, F>(&mut self, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<R, E>,
    {
        let mut guard = self.session();
        let outcome = f(&mut *guard);
        drop(guard);
        outcome
    }

    fn release(&mut self) -> Result<Value> {
        let outcome = self.user_signout();
        self.api_key = None;
        outcome
    }

    // ========================================================================
    // Remote calls
    // ========================================================================

    /// Call any remote procedure with the session key added to `params`.
    pub fn call(&mut self, method: &str, mut params: Params) -> Result<Value> {
        let label = self.to_string();
        log_call(&label, method, &redact(&params), || {
            let api_key = self.require_login()?.to_string();
            params.insert("apikey".to_string(), Value::String(api_key));
            self.remote(method, params)
        })
    }

    /// [`call`](Self::call) with parameters taken from any serializable struct or map.
    pub fn call_with<P: Serialize>(&mut self, method: &str, params: P) -> Result<Value> {
        match serde_json::to_value(params) {
            Ok(Value::Object(params)) => self.call(method, params),
            Ok(other) => Err(WobbleError::InvalidParams(format!(
                "expected named parameters, got {}",
                other
            ))),
            Err(e) => Err(WobbleError::InvalidParams(e.to_string())),
        }
    }

    /// Shorthand for `topic_set_archived(topic_id, archived = true)`.
    pub fn archive_topic(&mut self, topic_id: impl Into<Value>) -> Result<Value> {
        let mut params = Params::new();
        params.insert("topic_id".to_string(), topic_id.into());
        params.insert("archived".to_string(), Value::Bool(true));
        self.call("topic_set_archived", params)
    }

    /// End the session on the server. The local key is kept.
    pub fn user_signout(&mut self) -> Result<Value> {
        self.call("user_signout", Params::new())
    }

    fn remote(&mut self, method: &str, params: Params) -> Result<Value> {
        self.transport.call(method, params).map_err(|err| {
            debug!(method, error = %err, "transport failure");
            WobbleError::from_transport(err, self.transport.history().last_method())
        })
    }
}

impl<T: Transport> fmt::Display for WobbleService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<WobbleService({})>", self.endpoint)
    }
}

impl<T: Transport> fmt::Debug for WobbleService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WobbleService")
            .field("endpoint", &self.endpoint)
            .field("logged_in", &self.is_logged_in())
            .field("last_notification_timestamp", &self.last_notification_timestamp)
            .finish()
    }
}

/// Session scope returned by [`WobbleService::session`].
///
/// Dereferences to the service. When dropped it calls `user_signout` once and
/// discards the API key; a failing sign-out is logged, not raised.
pub struct SessionGuard<'a, T: Transport> {
    service: &'a mut WobbleService<T>,
    released: bool,
}

impl<T: Transport> SessionGuard<'_, T> {
    /// Sign out now and report the outcome instead of logging it.
    pub fn close(mut self) -> Result<Value> {
        self.released = true;
        self.service.release()
    }
}

impl<T: Transport> Deref for SessionGuard<'_, T> {
    type Target = WobbleService<T>;

    fn deref(&self) -> &Self::Target {
        self.service
    }
}

impl<T: Transport> DerefMut for SessionGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.service
    }
}

impl<T: Transport> Drop for SessionGuard<'_, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.service.release() {
            Ok(_) => {}
            Err(WobbleError::LoginRequired(_)) => {
                debug!(service = %self.service, "scope ended without a session");
            }
            Err(e) => {
                warn!(service = %self.service, error = %e, "sign-out failed");
            }
        }
    }
}
