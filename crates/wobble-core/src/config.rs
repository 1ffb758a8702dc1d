//! Client configuration: endpoint and credentials.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. JSON config file (`WOBBLE_CONFIG`, else `~/.wobble/config.json`)
//! 3. Environment (`WOBBLE_ENDPOINT`, `WOBBLE_EMAIL`, `WOBBLE_PASSWORD`)
//! 4. Explicit overrides (CLI flags)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, WobbleError};
use crate::service::DEFAULT_ENDPOINT;

pub const CONFIG_ENV: &str = "WOBBLE_CONFIG";
pub const ENDPOINT_ENV: &str = "WOBBLE_ENDPOINT";
pub const EMAIL_ENV: &str = "WOBBLE_EMAIL";
pub const PASSWORD_ENV: &str = "WOBBLE_PASSWORD";

/// Default config file path.
///
/// Tries, in order:
/// 1. WOBBLE_CONFIG env var
/// 2. ~/.wobble/config.json
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(expand(&path));
    }

    dirs::home_dir().map(|home| home.join(".wobble").join("config.json"))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// On-disk config file; every field is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    endpoint: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

/// Values that take precedence over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<String>,
    pub endpoint: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            email: None,
            password: None,
        }
    }
}

impl ClientConfig {
    /// Load from file, environment and `overrides`.
    ///
    /// A missing file at the default location is ignored; a missing file named
    /// explicitly is an error.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = match overrides.config_path.as_deref() {
            Some(path) => Some(read_config_file(&expand(path))?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(read_config_file(&path)?),
                _ => None,
            },
        };

        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Ok(Self::resolve(
            file.unwrap_or_default(),
            env(ENDPOINT_ENV),
            env(EMAIL_ENV),
            env(PASSWORD_ENV),
            overrides,
        ))
    }

    /// Load from a specific file only, without environment lookups.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = read_config_file(path.as_ref())?;
        Ok(Self::resolve(file, None, None, None, &Overrides::default()))
    }

    fn resolve(
        file: ConfigFile,
        env_endpoint: Option<String>,
        env_email: Option<String>,
        env_password: Option<String>,
        overrides: &Overrides,
    ) -> Self {
        let endpoint = overrides
            .endpoint
            .clone()
            .or(env_endpoint)
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Self {
            endpoint,
            email: overrides.email.clone().or(env_email).or(file.email),
            password: overrides.password.clone().or(env_password).or(file.password),
        }
    }

    /// Email and password, or a config error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            (None, _) => Err(WobbleError::Config(format!(
                "no email configured (use --email or {})",
                EMAIL_ENV
            ))),
            (_, None) => Err(WobbleError::Config(format!(
                "no password configured (use --password or {})",
                PASSWORD_ENV
            ))),
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WobbleError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| WobbleError::Config(format!("Invalid config file {:?}: {}", path, e)))
}
