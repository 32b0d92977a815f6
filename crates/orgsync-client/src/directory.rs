//! Client for the group directory (the desired-state source).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use orgsync_core::{DirectoryGroup, DirectoryService, SyncResult};

use crate::auth::TokenProvider;
use crate::request::fetch_json;

/// HTTP client for the directory's group-listing API.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    auth: TokenProvider,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GroupListResponse {
    #[serde(default)]
    groups: Vec<GroupResource>,
}

#[derive(Debug, Deserialize)]
struct GroupResource {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct MemberListResponse {
    #[serde(default)]
    members: Vec<MemberResource>,
}

#[derive(Debug, Deserialize)]
struct MemberResource {
    email: String,
}

impl DirectoryClient {
    /// Create a new directory client.
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
impl DirectoryService for DirectoryClient {
    async fn list_groups(&self, query: &str) -> SyncResult<Vec<DirectoryGroup>> {
        debug!(query = %query, "Listing directory groups");
        let url = format!("{}/groups", self.base_url);
        let builder = self.http_client.get(&url).query(&[("query", query)]);
        let response: GroupListResponse = fetch_json(&self.auth, builder).await?;
        Ok(response
            .groups
            .into_iter()
            .map(|g| DirectoryGroup {
                id: g.id,
                email: g.email,
            })
            .collect())
    }

    async fn list_members(&self, group_id: &str) -> SyncResult<Vec<String>> {
        let url = format!("{}/groups/{}/members", self.base_url, group_id);
        let builder = self.http_client.get(&url);
        let response: MemberListResponse = fetch_json(&self.auth, builder).await?;
        Ok(response.members.into_iter().map(|m| m.email).collect())
    }
}
