//! Server settings from the environment, with `.env` support via `dotenvy`.

use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// `GHOST_BIND_ADDR`
    pub bind_addr: String,
    /// `DATABASE_URL`; when unset the demo keeps records in memory.
    pub database_url: Option<String>,
    /// `GHOST_SCHEMA`, schema holding the document tables.
    pub schema: String,
    /// `GHOST_REQUEST_TIMEOUT_MS`; unset means no deadline.
    pub request_timeout: Option<Duration>,
    /// `GHOST_BODY_LIMIT_BYTES`
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: None,
            schema: DEFAULT_SCHEMA.into(),
            request_timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = ServerConfig::default();

        let schema = get("GHOST_SCHEMA").unwrap_or(defaults.schema);
        if !is_identifier(&schema) {
            return Err(ConfigError::Invalid {
                var: "GHOST_SCHEMA",
                value: schema,
            });
        }

        let request_timeout = match get("GHOST_REQUEST_TIMEOUT_MS") {
            Some(raw) => Some(Duration::from_millis(parse_number(
                "GHOST_REQUEST_TIMEOUT_MS",
                raw,
            )?)),
            None => None,
        };

        let body_limit = match get("GHOST_BODY_LIMIT_BYTES") {
            Some(raw) => parse_number("GHOST_BODY_LIMIT_BYTES", raw)?,
            None => defaults.body_limit,
        };

        Ok(ServerConfig {
            bind_addr: get("GHOST_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: get("DATABASE_URL"),
            schema,
            request_timeout,
            body_limit,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
