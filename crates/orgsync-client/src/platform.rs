//! Client for the platform API (orgs, spaces, role bindings).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use orgsync_core::{
    BoundAccount, EntitlementSummary, OrgEntitlement, PlatformService, RoleKind, SpaceRef,
    SyncResult,
};

use crate::auth::TokenProvider;
use crate::request::{expect_success, fetch_json};

/// HTTP client for the platform's v2 API.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    base_url: String,
    auth: TokenProvider,
    http_client: reqwest::Client,
}

// ── Wire shapes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize)]
struct Resource {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    entity: Entity,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    guid: String,
}

#[derive(Debug, Default, Deserialize)]
struct Entity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct UserSummaryResponse {
    entity: UserSummaryEntity,
}

#[derive(Debug, Default, Deserialize)]
struct UserSummaryEntity {
    #[serde(default)]
    organizations: Vec<SummaryOrg>,
    #[serde(default)]
    managed_organizations: Vec<GuidHolder>,
    #[serde(default)]
    billing_managed_organizations: Vec<GuidHolder>,
    #[serde(default)]
    audited_organizations: Vec<GuidHolder>,
    #[serde(default)]
    spaces: Vec<GuidHolder>,
    #[serde(default)]
    managed_spaces: Vec<GuidHolder>,
    #[serde(default)]
    audited_spaces: Vec<GuidHolder>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryOrg {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    entity: SummaryOrgEntity,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryOrgEntity {
    #[serde(default)]
    spaces: Vec<GuidHolder>,
}

#[derive(Debug, Default, Deserialize)]
struct GuidHolder {
    #[serde(default)]
    metadata: Metadata,
}

fn guids(holders: Vec<GuidHolder>) -> Vec<String> {
    holders.into_iter().map(|h| h.metadata.guid).collect()
}

// ── Client ────────────────────────────────────────────────────────────

impl PlatformClient {
    /// Create a new platform client.
    #[must_use]
    pub fn new(base_url: String, auth: TokenProvider, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            http_client,
        }
    }

    fn org_role_path(&self, org_id: &str, role: RoleKind) -> String {
        format!(
            "{}/v2/organizations/{}/{}",
            self.base_url,
            org_id,
            role.path_segment()
        )
    }

    fn space_role_path(&self, space_id: &str, role: RoleKind) -> String {
        format!(
            "{}/v2/spaces/{}/{}",
            self.base_url,
            space_id,
            role.path_segment()
        )
    }

    async fn grant(&self, path: &str, username: &str) -> SyncResult<()> {
        let builder = self
            .http_client
            .put(path)
            .json(&json!({ "username": username }));
        expect_success(&self.auth, builder).await
    }

    /// Revocation uses the `/remove` sub-resource via POST; both 200 and
    /// 204 count as success.
    async fn revoke(&self, path: &str, username: &str) -> SyncResult<()> {
        let builder = self
            .http_client
            .post(format!("{path}/remove"))
            .json(&json!({ "username": username }));
        expect_success(&self.auth, builder).await
    }

    async fn role_members(&self, path: &str) -> SyncResult<Vec<BoundAccount>> {
        let builder = self.http_client.get(path);
        let list: ResourceList = fetch_json(&self.auth, builder).await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| BoundAccount {
                account_id: r.metadata.guid,
                username: r.entity.username,
            })
            .collect())
    }
}

#[async_trait]
impl PlatformService for PlatformClient {
    async fn find_org_by_name(&self, name: &str) -> SyncResult<Vec<String>> {
        debug!(org = %name, "Looking up org by exact name");
        let url = format!("{}/v2/organizations", self.base_url);
        let builder = self
            .http_client
            .get(&url)
            .query(&[("q", format!("name:{name}"))]);
        let list: ResourceList = fetch_json(&self.auth, builder).await?;
        Ok(list.resources.into_iter().map(|r| r.metadata.guid).collect())
    }

    async fn find_space_by_name(&self, name: &str, org_id: &str) -> SyncResult<Vec<String>> {
        let url = format!("{}/v2/spaces", self.base_url);
        let builder = self.http_client.get(&url).query(&[
            ("q", format!("name:{name}")),
            ("q", format!("organization_guid:{org_id}")),
        ]);
        let list: ResourceList = fetch_json(&self.auth, builder).await?;
        Ok(list.resources.into_iter().map(|r| r.metadata.guid).collect())
    }

    async fn list_spaces(&self, org_id: &str) -> SyncResult<Vec<SpaceRef>> {
        let url = format!("{}/v2/organizations/{}/spaces", self.base_url, org_id);
        let builder = self.http_client.get(&url);
        let list: ResourceList = fetch_json(&self.auth, builder).await?;
        Ok(list
            .resources
            .into_iter()
            .map(|r| SpaceRef {
                space_id: r.metadata.guid,
                name: r.entity.name,
            })
            .collect())
    }

    async fn register_account(&self, account_id: &str) -> SyncResult<()> {
        let url = format!("{}/v2/users", self.base_url);
        let builder = self
            .http_client
            .post(&url)
            .json(&json!({ "guid": account_id }));
        expect_success(&self.auth, builder).await
    }

    async fn associate_user_with_org(&self, org_id: &str, username: &str) -> SyncResult<()> {
        let url = format!("{}/v2/organizations/{}/users", self.base_url, org_id);
        let builder = self
            .http_client
            .put(&url)
            .json(&json!({ "username": username }));
        expect_success(&self.auth, builder).await
    }

    async fn grant_org_role(
        &self,
        org_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.grant(&self.org_role_path(org_id, role), username).await
    }

    async fn revoke_org_role(
        &self,
        org_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.revoke(&self.org_role_path(org_id, role), username).await
    }

    async fn grant_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.grant(&self.space_role_path(space_id, role), username)
            .await
    }

    async fn revoke_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.revoke(&self.space_role_path(space_id, role), username)
            .await
    }

    async fn org_role_members(
        &self,
        org_id: &str,
        role: RoleKind,
    ) -> SyncResult<Vec<BoundAccount>> {
        self.role_members(&self.org_role_path(org_id, role)).await
    }

    async fn space_role_members(
        &self,
        space_id: &str,
        role: RoleKind,
    ) -> SyncResult<Vec<BoundAccount>> {
        self.role_members(&self.space_role_path(space_id, role)).await
    }

    async fn entitlement_summary(&self, account_id: &str) -> SyncResult<EntitlementSummary> {
        let url = format!("{}/v2/users/{}/summary", self.base_url, account_id);
        let builder = self.http_client.get(&url);
        let summary: UserSummaryResponse = fetch_json(&self.auth, builder).await?;
        let entity = summary.entity;

        Ok(EntitlementSummary {
            orgs: entity
                .organizations
                .into_iter()
                .map(|o| OrgEntitlement {
                    org_id: o.metadata.guid,
                    space_ids: guids(o.entity.spaces),
                })
                .collect(),
            managed_org_ids: guids(entity.managed_organizations),
            billing_org_ids: guids(entity.billing_managed_organizations),
            audited_org_ids: guids(entity.audited_organizations),
            developer_space_ids: guids(entity.spaces),
            managed_space_ids: guids(entity.managed_spaces),
            audited_space_ids: guids(entity.audited_spaces),
        })
    }

    async fn detach_user_from_org(&self, org_id: &str, account_id: &str) -> SyncResult<()> {
        let url = format!(
            "{}/v2/organizations/{}/users/{}",
            self.base_url, org_id, account_id
        );
        let builder = self.http_client.delete(&url);
        expect_success(&self.auth, builder).await
    }
}
