//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ErrorCode;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_NAMESPACE: &str = "algomaster";
pub const DEFAULT_STATE_DIR: &str = ".algomaster";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// A variable required by the selected options is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::Missing { .. } => "E_CONFIG_MISSING",
        }
    }
}

/// Which identity provider backs the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityBackend {
    /// In-process mock; no network.
    Mock,
    /// JSON API rooted at `base_url`.
    Http { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Prefix for storage keys (`<namespace>.auth`, `<namespace>.theme`).
    pub namespace: String,
    /// Directory holding persisted store projections.
    pub state_dir: PathBuf,
    pub identity: IdentityBackend,
    pub request_timeout: Duration,
    /// Lifetime after which a mock token counts as expired.
    pub token_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            identity: IdentityBackend::Mock,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `ALGOMASTER_NAMESPACE`: storage key prefix, default `algomaster`
    /// - `ALGOMASTER_STATE_DIR`: default `.algomaster`
    /// - `ALGOMASTER_IDENTITY`: `mock` (default) or `http`
    /// - `ALGOMASTER_API_BASE_URL`: required when `ALGOMASTER_IDENTITY=http`
    /// - `ALGOMASTER_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ALGOMASTER_TOKEN_TTL_SECS`: default 3600
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown identity backend, an invalid
    /// namespace, or a missing API base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let namespace = lookup("ALGOMASTER_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        validate_namespace(&namespace)?;

        let state_dir = lookup("ALGOMASTER_STATE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);
        let identity = parse_identity(lookup("ALGOMASTER_IDENTITY").as_deref(), lookup("ALGOMASTER_API_BASE_URL"))?;
        let request_timeout = Duration::from_secs(parse_secs(
            lookup("ALGOMASTER_REQUEST_TIMEOUT_SECS").as_deref(),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let token_ttl =
            Duration::from_secs(parse_secs(lookup("ALGOMASTER_TOKEN_TTL_SECS").as_deref(), DEFAULT_TOKEN_TTL_SECS));

        Ok(Self { namespace, state_dir, identity, request_timeout, token_ttl })
    }
}

fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Parse(format!("invalid ALGOMASTER_NAMESPACE: {namespace:?}")))
    }
}

fn parse_identity(raw: Option<&str>, base_url: Option<String>) -> Result<IdentityBackend, ConfigError> {
    match raw.unwrap_or("mock") {
        "mock" => Ok(IdentityBackend::Mock),
        "http" => {
            let base_url = base_url
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing { var: "ALGOMASTER_API_BASE_URL".into() })?;
            Ok(IdentityBackend::Http { base_url: base_url.trim().trim_end_matches('/').to_owned() })
        }
        other => Err(ConfigError::Parse(format!("unknown ALGOMASTER_IDENTITY: {other}"))),
    }
}

/// Parse a positive number of seconds, falling back to `default`.
fn parse_secs(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
