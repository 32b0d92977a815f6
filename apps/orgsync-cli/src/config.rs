//! Runner configuration loaded from environment variables.
//!
//! Loading is fail-fast: every required variable must be present and
//! valid before any client is built, or the run refuses to start.

use std::env;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Default HTTP request timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Everything the runner needs to talk to the three backends.
#[derive(Debug)]
pub struct Config {
    /// Base URL of the group directory API.
    pub directory_url: String,
    /// Static bearer token for the directory API.
    pub directory_token: SecretString,
    /// Base URL of the identity store.
    pub identity_url: String,
    /// Base URL of the platform API.
    pub platform_url: String,
    /// OAuth token endpoint for the refresh-token grant.
    pub token_endpoint: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret, when the client is confidential.
    pub client_secret: Option<SecretString>,
    /// Long-lived refresh token for the platform and identity APIs.
    pub refresh_token: SecretString,
    /// Identity-provider origin tag owned by the reconciler.
    pub managed_origin: String,
    /// Substring query selecting the directory groups to reconcile.
    pub group_query: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from `ORGSYNC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through a variable lookup, so tests can feed
    /// values without touching process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |var: &str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(var.to_string()))
        };

        let http_timeout = match lookup("ORGSYNC_HTTP_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    var: "ORGSYNC_HTTP_TIMEOUT_SECS".to_string(),
                    message: format!("{e}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "ORGSYNC_HTTP_TIMEOUT_SECS".to_string(),
                        message: "timeout must be at least 1 second".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
        };

        Ok(Self {
            directory_url: require("ORGSYNC_DIRECTORY_URL")?,
            directory_token: SecretString::new(require("ORGSYNC_DIRECTORY_TOKEN")?),
            identity_url: require("ORGSYNC_IDENTITY_URL")?,
            platform_url: require("ORGSYNC_PLATFORM_URL")?,
            token_endpoint: require("ORGSYNC_TOKEN_ENDPOINT")?,
            client_id: require("ORGSYNC_CLIENT_ID")?,
            client_secret: lookup("ORGSYNC_CLIENT_SECRET")
                .filter(|v| !v.is_empty())
                .map(SecretString::new),
            refresh_token: SecretString::new(require("ORGSYNC_REFRESH_TOKEN")?),
            managed_origin: require("ORGSYNC_MANAGED_ORIGIN")?,
            group_query: require("ORGSYNC_GROUP_QUERY")?,
            http_timeout,
        })
    }
}
