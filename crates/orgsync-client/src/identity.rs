//! Client for the identity store (account records and origins).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use orgsync_core::{AccountRef, IdentityService, SyncError, SyncResult};

use crate::auth::TokenProvider;
use crate::request::{api_error, fetch_json, send_authorized};

/// Attribute whitelist for username searches; keeps responses small.
const SEARCH_ATTRIBUTES: &str = "id,userName,origin,active";

/// HTTP client for the identity store's user API.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    base_url: String,
    auth: TokenProvider,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UserSearchResponse {
    #[serde(default)]
    resources: Vec<UserResource>,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    id: String,
    #[serde(rename = "userName")]
    username: String,
    #[serde(default)]
    origin: String,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    #[serde(default)]
    id: String,
}

impl IdentityClient {
    /// Create a new identity-store client.
    #[must_use]
    pub fn new(base_url: String, auth: TokenProvider, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            http_client,
        }
    }
}

#[async_trait]
impl IdentityService for IdentityClient {
    async fn find_by_username(&self, username: &str) -> SyncResult<Vec<AccountRef>> {
        let filter = format!("userName eq \"{}\"", escape_filter_value(username));
        let url = format!("{}/Users", self.base_url);
        let builder = self
            .http_client
            .get(&url)
            .query(&[("attributes", SEARCH_ATTRIBUTES), ("filter", &filter)]);
        let response: UserSearchResponse = fetch_json(&self.auth, builder).await?;
        debug!(
            username = %username,
            matches = response.resources.len(),
            "Identity search by username"
        );
        Ok(response
            .resources
            .into_iter()
            .map(|u| AccountRef {
                account_id: u.id,
                username: u.username,
                origin: u.origin,
            })
            .collect())
    }

    async fn create_account(&self, username: &str, origin: &str) -> SyncResult<String> {
        let payload = json!({
            "emails": [{ "primary": true, "value": username }],
            "name": { "familyName": username, "givenName": username },
            "origin": origin,
            "userName": username,
        });

        let url = format!("{}/Users", self.base_url);
        let builder = self.http_client.post(&url).json(&payload);
        let response = send_authorized(&self.auth, builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let created: CreatedUser = response
            .json()
            .await
            .map_err(|e| SyncError::ProvisioningFailed {
                username: username.to_string(),
                reason: format!("unreadable create response: {e}"),
            })?;
        if created.id.is_empty() {
            return Err(SyncError::ProvisioningFailed {
                username: username.to_string(),
                reason: "identity store returned no account ID".to_string(),
            });
        }

        info!(username = %username, origin = %origin, "Created shadow identity");
        Ok(created.id)
    }

    async fn find_by_account_id(&self, account_id: &str) -> SyncResult<AccountRef> {
        let url = format!("{}/Users/{}", self.base_url, account_id);
        let builder = self.http_client.get(&url);
        let user: UserResource = fetch_json(&self.auth, builder).await?;
        Ok(AccountRef {
            account_id: user.id,
            username: user.username,
            origin: user.origin,
        })
    }
}

/// Escape a value for use inside a double-quoted filter string literal,
/// preventing filter injection through crafted usernames.
fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
