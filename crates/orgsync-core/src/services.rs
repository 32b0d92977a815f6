//! Service contracts consumed by the reconciliation engine.
//!
//! These traits describe what the engine needs from the three backends;
//! transport, wire shapes, and credential handling live behind them in
//! `orgsync-client`. Tests implement them with in-memory fakes.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::role::RoleKind;
use crate::types::{AccountRef, BoundAccount, DirectoryGroup, EntitlementSummary, SpaceRef};

/// The directory holding groups and their memberships (the desired state).
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// List groups whose identifier matches the query pattern.
    async fn list_groups(&self, query: &str) -> SyncResult<Vec<DirectoryGroup>>;

    /// List the member usernames (emails) of one group, exactly as the
    /// directory reports them, with no filtering.
    async fn list_members(&self, group_id: &str) -> SyncResult<Vec<String>>;
}

/// The identity store that owns account records and origins.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Search by exact username. May return zero, one, or more matches;
    /// the caller decides what multiplicity is acceptable.
    async fn find_by_username(&self, username: &str) -> SyncResult<Vec<AccountRef>>;

    /// Create a new identity tagged with the given origin. Returns the new
    /// account ID.
    async fn create_account(&self, username: &str, origin: &str) -> SyncResult<String>;

    /// Look up one account by its ID, primarily to learn its origin.
    async fn find_by_account_id(&self, account_id: &str) -> SyncResult<AccountRef>;
}

/// The platform that owns orgs, spaces, and role bindings (the observed
/// state, and the target of all mutations).
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Exact-name org lookup. Returns all matching org IDs.
    async fn find_org_by_name(&self, name: &str) -> SyncResult<Vec<String>>;

    /// Exact-name space lookup scoped to an org. Returns all matching
    /// space IDs.
    async fn find_space_by_name(&self, name: &str, org_id: &str) -> SyncResult<Vec<String>>;

    /// All spaces of an org (for SpaceDeveloper fan-out).
    async fn list_spaces(&self, org_id: &str) -> SyncResult<Vec<SpaceRef>>;

    /// Register an identity-store account ID in the platform's own account
    /// registry (the second half of shadow provisioning).
    async fn register_account(&self, account_id: &str) -> SyncResult<()>;

    /// Ensure the user is associated with the org, the prerequisite
    /// relation for holding any role there.
    async fn associate_user_with_org(&self, org_id: &str, username: &str) -> SyncResult<()>;

    /// Grant an org-level role.
    async fn grant_org_role(&self, org_id: &str, role: RoleKind, username: &str)
        -> SyncResult<()>;

    /// Revoke an org-level role.
    async fn revoke_org_role(
        &self,
        org_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()>;

    /// Grant a space-level role.
    async fn grant_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()>;

    /// Revoke a space-level role.
    async fn revoke_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()>;

    /// Accounts currently bound to an org-level role.
    async fn org_role_members(&self, org_id: &str, role: RoleKind)
        -> SyncResult<Vec<BoundAccount>>;

    /// Accounts currently bound to a space-level role.
    async fn space_role_members(
        &self,
        space_id: &str,
        role: RoleKind,
    ) -> SyncResult<Vec<BoundAccount>>;

    /// The account's full entitlement summary across all orgs and spaces.
    async fn entitlement_summary(&self, account_id: &str) -> SyncResult<EntitlementSummary>;

    /// Remove the account's base association with the org.
    async fn detach_user_from_org(&self, org_id: &str, account_id: &str) -> SyncResult<()>;
}
