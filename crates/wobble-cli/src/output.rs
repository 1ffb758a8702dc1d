//! JSON output for results and errors.

use serde_json::{json, Value};
use wobble_core::WobbleError;

/// Serialize `value`, pretty-printed if requested.
pub fn render(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    } else {
        value.to_string()
    }
}

/// Format an error with a stable shape: `{"ok": false, "error": {code, message}}`.
pub fn error_json(err: &WobbleError) -> Value {
    let message = match err {
        // Protocol messages are already user-facing
        WobbleError::Protocol(msg) | WobbleError::LoginRequired(msg) => msg.clone(),
        other => other.to_string(),
    };

    json!({
        "ok": false,
        "error": {
            "code": err.code(),
            "message": message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json_protocol() {
        let err = WobbleError::Protocol("Wobble-API does not include Method \"x\"".to_string());
        let out = error_json(&err);

        assert_eq!(out["ok"], false);
        assert_eq!(out["error"]["code"], "PROTOCOL_ERROR");
        assert_eq!(out["error"]["message"], "Wobble-API does not include Method \"x\"");
    }

    #[test]
    fn test_error_json_config() {
        let out = error_json(&WobbleError::Config("no email configured".to_string()));
        assert_eq!(out["error"]["code"], "CONFIG_ERROR");
        assert_eq!(out["error"]["message"], "Config error: no email configured");
    }

    #[test]
    fn test_render_compact_and_pretty() {
        let value = json!({ "a": 1 });
        assert_eq!(render(&value, false), r#"{"a":1}"#);
        assert_eq!(render(&value, true), "{\n  \"a\": 1\n}");
    }
}
