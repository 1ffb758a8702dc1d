//! Debug logging around every API call.
//!
//! Each call emits one event before it runs and one after, both at debug
//! level under the `wobble_core::calls` target.

use std::fmt::{Debug, Display};

use tracing::debug;

use crate::protocol::Params;

/// Log target for call entry/exit events.
pub const CALL_TARGET: &str = "wobble_core::calls";

/// Parameter names whose values never reach the log.
const SECRET_PARAMS: &[&str] = &["password", "apikey"];

/// Run `f`, logging `{owner}.{method}{args}` before and the result after.
pub fn log_call<O, A, T, E, F>(owner: &O, method: &str, args: &A, f: F) -> Result<T, E>
where
    O: Display + ?Sized,
    A: Debug + ?Sized,
    T: Debug,
    E: Debug,
    F: FnOnce() -> Result<T, E>,
{
    log_call_as(owner, method, args, f, |result| format!("{:?}", result))
}

/// Like [`log_call`], but a successful result is logged as `Ok("***")`.
pub fn log_secret_call<O, A, T, E, F>(owner: &O, method: &str, args: &A, f: F) -> Result<T, E>
where
    O: Display + ?Sized,
    A: Debug + ?Sized,
    E: Debug,
    F: FnOnce() -> Result<T, E>,
{
    log_call_as(owner, method, args, f, |result| match result {
        Ok(_) => "Ok(\"***\")".to_string(),
        Err(e) => format!("Err({:?})", e),
    })
}

fn log_call_as<O, A, T, E, F, R>(owner: &O, method: &str, args: &A, f: F, render: R) -> Result<T, E>
where
    O: Display + ?Sized,
    A: Debug + ?Sized,
    F: FnOnce() -> Result<T, E>,
    R: FnOnce(&Result<T, E>) -> String,
{
    debug!(target: CALL_TARGET, "{}.{}{:?}", owner, method, args);

    let result = f();

    if tracing::enabled!(target: CALL_TARGET, tracing::Level::DEBUG) {
        let rendered = render(&result);
        debug!(target: CALL_TARGET, "{}.{}{:?} ->\t{}", owner, method, args, rendered);
    }

    result
}

/// Copy of `params` with secret values masked.
pub fn redact(params: &Params) -> Params {
    params
        .iter()
        .map(|(key, value)| {
            if SECRET_PARAMS.contains(&key.as_str()) {
                (key.clone(), serde_json::Value::String("***".to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Collect everything logged at debug level or above while `f` runs.
#[cfg(test)]
pub(crate) fn capture_logs<F: FnOnce()>(f: F) -> String {
    use std::sync::{Arc, Mutex};

    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .with_writer(move || Sink(Arc::clone(&writer)))
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
