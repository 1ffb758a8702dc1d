//! End-to-end session tests against an in-process JSON-RPC server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};
use wobble_core::{Params, Transport, WobbleError, WobbleService};

type Requests = Arc<Mutex<Vec<Value>>>;

/// Minimal HTTP/1.1 server answering JSON-RPC posts like the Wobble API.
struct FakeApi {
    endpoint: String,
    requests: Requests,
}

impl FakeApi {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/api/endpoint.php", listener.local_addr().unwrap());
        let requests: Requests = Arc::default();

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let recorded = Arc::clone(&recorded);
                thread::spawn(move || serve_connection(stream, recorded));
            }
        });

        Self { endpoint, requests }
    }

    fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn request(&self, index: usize) -> Value {
        self.requests.lock().unwrap()[index].clone()
    }
}

fn serve_connection(stream: TcpStream, recorded: Requests) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
            return;
        }

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            return;
        }
        let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        recorded.lock().unwrap().push(request.clone());

        let (status, body) = answer(&request);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
    }
}

fn answer(request: &Value) -> (&'static str, String) {
    let id = request["id"].clone();
    let params = &request["params"];

    let result = match request["method"].as_str() {
        Some("user_login") if params["email"] == "user@example.com" && params["password"] == "pw" => {
            json!({ "apikey": "XYZ", "user_id": 1 })
        }
        Some("user_login") => {
            return ok(json!({ "id": id, "result": { "error": "wrong credentials" } }));
        }
        Some("user_signout") | Some("topic_set_archived") if params["apikey"] == "XYZ" => json!(true),
        Some("server_crash") => return ("500 Internal Server Error", "fatal".to_string()),
        _ => {
            return ok(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "Method not found" }
            }));
        }
    };

    ok(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn ok(body: Value) -> (&'static str, String) {
    ("200 OK", body.to_string())
}

#[test]
fn test_scoped_session_over_http() {
    let api = FakeApi::start();
    let mut service = WobbleService::new(api.endpoint.clone());

    service
        .scoped(|svc| {
            svc.connect("User@Example.com", "pw")?;
            assert!(svc.is_logged_in());
            svc.archive_topic(42)
        })
        .unwrap();

    assert!(!service.is_logged_in());
    assert_eq!(
        api.methods(),
        vec!["user_login", "topic_set_archived", "user_signout"]
    );

    let login = api.request(0);
    assert_eq!(login["jsonrpc"], "2.0");
    assert_eq!(login["params"], json!({ "email": "user@example.com", "password": "pw" }));

    let archive = api.request(1);
    assert_eq!(
        archive["params"],
        json!({ "topic_id": 42, "archived": true, "apikey": "XYZ" })
    );
}

#[test]
fn test_unknown_remote_method() {
    let api = FakeApi::start();
    let mut service = WobbleService::new(api.endpoint.clone());
    service.connect("user@example.com", "pw").unwrap();

    let err = service.call("topic_frobnicate", Params::new()).unwrap_err();
    match err {
        WobbleError::Protocol(msg) => {
            assert_eq!(msg, "Wobble-API does not include Method \"topic_frobnicate\"")
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let history = service.transport().history();
    assert_eq!(history.last_method().as_deref(), Some("topic_frobnicate"));
    assert!(history.response.as_deref().unwrap_or_default().contains("-32601"));
}

#[test]
fn test_http_failure_is_protocol_error() {
    let api = FakeApi::start();
    let mut service = WobbleService::new(api.endpoint.clone());
    service.connect("user@example.com", "pw").unwrap();

    let err = service.call("server_crash", Params::new()).unwrap_err();
    assert!(matches!(err, WobbleError::Protocol(_)));
}

#[test]
fn test_login_response_without_apikey() {
    let api = FakeApi::start();
    let mut service = WobbleService::new(api.endpoint.clone());

    let err = service.connect("user@example.com", "wrong").unwrap_err();
    assert!(matches!(err, WobbleError::MissingField("apikey")));
    assert!(!service.is_logged_in());
}

#[test]
fn test_unreachable_endpoint_is_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut service = WobbleService::new(format!("http://{}/api", addr));

    let err = service.user_login("user@example.com", "pw").unwrap_err();
    assert!(matches!(err, WobbleError::Transport(_)));
}
