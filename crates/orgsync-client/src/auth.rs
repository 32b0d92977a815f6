//! Token acquisition and refresh for the platform and identity APIs.
//!
//! No ambient token state: a [`TokenProvider`] value is handed to every
//! client, and refresh is an explicit call driven by the retry wrapper.

use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use orgsync_core::{SyncError, SyncResult};

use crate::transport;

/// Refresh tokens slightly before their reported expiry.
const EXPIRY_GRACE_SECS: u64 = 30;

/// Credentials for a backend API.
#[derive(Clone)]
pub enum PlatformCredentials {
    /// A static bearer token (directory service, tests).
    Bearer { token: SecretString },

    /// Refresh-token grant against an OAuth token endpoint.
    RefreshToken {
        token_endpoint: String,
        client_id: String,
        client_secret: Option<SecretString>,
        refresh_token: SecretString,
    },
}

impl std::fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::RefreshToken {
                token_endpoint,
                client_id,
                ..
            } => f
                .debug_struct("RefreshToken")
                .field("token_endpoint", token_endpoint)
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("refresh_token", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Token endpoint response (the fields the client cares about).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Cached access token with expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

/// Provides bearer tokens for one backend, refreshing on demand.
///
/// Cloning shares the token cache.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    credentials: PlatformCredentials,
    http_client: reqwest::Client,
    cached: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenProvider {
    /// Create a provider from credentials.
    #[must_use]
    pub fn new(credentials: PlatformCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a bearer token, using the cache when it is still valid.
    pub async fn bearer_token(&self) -> SyncResult<String> {
        match &self.credentials {
            PlatformCredentials::Bearer { token } => Ok(token.expose_secret().clone()),
            PlatformCredentials::RefreshToken { .. } => {
                {
                    let cache = self.cached.read().await;
                    if let Some(cached) = cache.as_ref() {
                        if !cached.is_expired() {
                            return Ok(cached.access_token.clone());
                        }
                    }
                }
                self.refresh().await
            }
        }
    }

    /// Fetch a fresh access token, replacing the cache.
    ///
    /// For static bearer credentials there is nothing to refresh; the same
    /// token is returned, and a second 401 will surface as
    /// [`SyncError::AuthExpired`] in the retry wrapper.
    pub async fn refresh(&self) -> SyncResult<String> {
        let PlatformCredentials::RefreshToken {
            token_endpoint,
            client_id,
            client_secret,
            refresh_token,
        } = &self.credentials
        else {
            return Box::pin(self.bearer_token()).await;
        };

        debug!(token_endpoint = %token_endpoint, "Refreshing access token");

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", client_id.clone()),
            ("refresh_token", refresh_token.expose_secret().clone()),
        ];
        if let Some(secret) = client_secret {
            form.push(("client_secret", secret.expose_secret().clone()));
        }

        let response = self
            .http_client
            .post(token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                detail: format!("token endpoint: {body}"),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::InvalidConfig(format!("bad token response: {e}")))?;

        let expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs.saturating_sub(EXPIRY_GRACE_SECS)));

        let access_token = token.access_token.clone();
        {
            let mut cache = self.cached.write().await;
            *cache = Some(CachedToken {
                access_token: token.access_token,
                expires_at,
            });
        }

        Ok(access_token)
    }

    /// Drop the cached token so the next request fetches a fresh one.
    pub async fn invalidate(&self) {
        let mut cache = self.cached.write().await;
        *cache = None;
    }
}
