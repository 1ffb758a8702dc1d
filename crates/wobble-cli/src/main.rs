//! wobble - command-line client for the Wobble API.
//!
//! Every command logs in, runs inside a session scope, and signs out before
//! exiting. Results are printed as JSON on stdout; errors as a stable JSON
//! shape on stderr.

mod output;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::process::ExitCode;
use wobble_core::{ClientConfig, Overrides, Params, WobbleError, WobbleService};

/// Command-line client for the Wobble API.
#[derive(Parser, Debug)]
#[command(name = "wobble")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file (default: $WOBBLE_CONFIG or ~/.wobble/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// API endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Account email
    #[arg(long, global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the credentials are accepted
    Login,

    /// Call any remote procedure (the API key is added automatically)
    Call {
        /// Remote method name (e.g., topic_list)
        method: String,

        /// Named parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Archive a topic
    ArchiveTopic {
        /// Topic id
        topic_id: String,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    match run(cli) {
        Ok(result) => {
            println!("{}", output::render(&result, pretty));
            ExitCode::from(0)
        }
        Err(e) => {
            eprintln!("{}", output::render(&output::error_json(&e), pretty));
            if e.is_local() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

fn run(cli: Cli) -> Result<Value, WobbleError> {
    let overrides = Overrides {
        config_path: cli.config,
        endpoint: cli.endpoint,
        email: cli.email,
        password: cli.password,
    };
    let config = ClientConfig::load(&overrides)?;
    let (email, password) = config.credentials()?;

    let action = Action::from_command(cli.command)?;

    let mut service = WobbleService::new(config.endpoint.clone());
    tracing::debug!(service = %service, "starting session");

    service.scoped(|svc| {
        svc.connect(email, password)?;

        match action {
            Action::Login => Ok(json!({
                "logged_in": svc.is_logged_in(),
                "endpoint": svc.endpoint(),
            })),
            Action::Call { method, params } => svc.call(&method, params),
            Action::ArchiveTopic(topic_id) => svc.archive_topic(topic_id),
        }
    })
}

/// A command with its arguments validated, ready to run in a session.
#[derive(Debug)]
enum Action {
    Login,
    Call { method: String, params: Params },
    ArchiveTopic(Value),
}

impl Action {
    // Validates before logging in so bad input costs no round trip.
    fn from_command(command: Command) -> Result<Self, WobbleError> {
        Ok(match command {
            Command::Login => Action::Login,
            Command::Call { method, params } => Action::Call {
                params: parse_params(params.as_deref())?,
                method,
            },
            Command::ArchiveTopic { topic_id } => Action::ArchiveTopic(topic_id_value(&topic_id)),
        })
    }
}

/// Parse `--params` into a named-parameter map.
fn parse_params(raw: Option<&str>) -> Result<Params, WobbleError> {
    let Some(raw) = raw else {
        return Ok(Params::new());
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(WobbleError::InvalidParams(format!(
            "--params must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(WobbleError::InvalidParams(format!("--params is not valid JSON: {}", e))),
    }
}

/// Numeric ids go out as numbers, anything else as a string.
fn topic_id_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}
