//! In-memory fakes for the three service contracts, plus a builder that
//! keeps account IDs consistent across the identity and platform fakes.

// Shared across several test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use orgsync_core::{
    AccountRef, BoundAccount, DirectoryGroup, DirectoryService, EntitlementSummary,
    IdentityService, OrgEntitlement, PlatformService, RoleKind, SpaceRef, SyncError, SyncResult,
};
use orgsync_engine::MembershipReconciler;

pub const MANAGED_ORIGIN: &str = "corp-sso";

fn not_found(what: &str) -> SyncError {
    SyncError::Api {
        status: 404,
        detail: format!("{what} not found"),
    }
}

// ── Directory ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDirectory {
    groups: Mutex<Vec<DirectoryGroup>>,
    members: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeDirectory {
    pub fn add_group(&self, id: &str, email: &str, members: &[&str]) {
        self.groups.lock().unwrap().push(DirectoryGroup {
            id: id.to_string(),
            email: email.to_string(),
        });
        self.members.lock().unwrap().insert(
            id.to_string(),
            members.iter().map(|m| (*m).to_string()).collect(),
        );
    }

    pub fn set_members(&self, group_id: &str, members: &[&str]) {
        self.members.lock().unwrap().insert(
            group_id.to_string(),
            members.iter().map(|m| (*m).to_string()).collect(),
        );
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn list_groups(&self, query: &str) -> SyncResult<Vec<DirectoryGroup>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.email.contains(query))
            .cloned()
            .collect())
    }

    async fn list_members(&self, group_id: &str) -> SyncResult<Vec<String>> {
        self.members
            .lock()
            .unwrap()
            .get(group_id)
            .cloned()
            .ok_or_else(|| not_found("group"))
    }
}

// ── Identity store ────────────────────────────────────────────────────

pub struct FakeIdentity {
    accounts: Mutex<Vec<AccountRef>>,
    /// username -> account_id, shared with the platform fake.
    ids: Arc<Mutex<HashMap<String, String>>>,
    pub created: Mutex<Vec<String>>,
}

impl FakeIdentity {
    fn new(ids: Arc<Mutex<HashMap<String, String>>>) -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            ids,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn add_account(&self, account_id: &str, username: &str, origin: &str) {
        self.accounts.lock().unwrap().push(AccountRef {
            account_id: account_id.to_string(),
            username: username.to_string(),
            origin: origin.to_string(),
        });
        self.ids
            .lock()
            .unwrap()
            .insert(username.to_string(), account_id.to_string());
    }

    pub fn created_usernames(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn find_by_username(&self, username: &str) -> SyncResult<Vec<AccountRef>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.username == username)
            .cloned()
            .collect())
    }

    async fn create_account(&self, username: &str, origin: &str) -> SyncResult<String> {
        let account_id = format!("u-new-{}", self.created.lock().unwrap().len());
        self.add_account(&account_id, username, origin);
        self.created.lock().unwrap().push(username.to_string());
        Ok(account_id)
    }

    async fn find_by_account_id(&self, account_id: &str) -> SyncResult<AccountRef> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.account_id == account_id)
            .cloned()
            .ok_or_else(|| not_found("account"))
    }
}

// ── Platform ──────────────────────────────────────────────────────────

#[derive(Default)]
struct PlatformState {
    /// org name -> ids (more than one models a duplicate name).
    orgs: HashMap<String, Vec<String>>,
    /// org id -> spaces.
    spaces: HashMap<String, Vec<SpaceRef>>,
    /// org id -> associated usernames.
    associations: HashMap<String, HashSet<String>>,
    org_roles: HashMap<(String, RoleKind), Vec<BoundAccount>>,
    space_roles: HashMap<(String, RoleKind), Vec<BoundAccount>>,
    registered: HashSet<String>,
}

pub struct FakePlatform {
    state: Mutex<PlatformState>,
    ids: Arc<Mutex<HashMap<String, String>>>,
    /// Space IDs whose grant/revoke calls fail with a 500.
    pub failing_spaces: Mutex<HashSet<String>>,
    /// When set, every mutation fails as an unrecoverable auth error.
    pub auth_expired: Mutex<bool>,
    /// Every mutation call, in order, for idempotence assertions.
    pub calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    fn new(ids: Arc<Mutex<HashMap<String, String>>>) -> Self {
        Self {
            state: Mutex::new(PlatformState::default()),
            ids,
            failing_spaces: Mutex::new(HashSet::new()),
            auth_expired: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn add_org(&self, name: &str) -> String {
        let org_id = format!("org-{name}");
        let mut state = self.state.lock().unwrap();
        state
            .orgs
            .entry(name.to_string())
            .or_default()
            .push(org_id.clone());
        state.spaces.entry(org_id.clone()).or_default();
        org_id
    }

    /// A second org under the same name, to drive the ambiguity path.
    pub fn add_duplicate_org(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .orgs
            .entry(name.to_string())
            .or_default()
            .push(format!("org-{name}-dup"));
    }

    pub fn add_space(&self, org_id: &str, name: &str) -> String {
        let space_id = format!("space-{name}");
        self.state
            .lock()
            .unwrap()
            .spaces
            .entry(org_id.to_string())
            .or_default()
            .push(SpaceRef {
                space_id: space_id.clone(),
                name: name.to_string(),
            });
        space_id
    }

    fn bound(&self, username: &str) -> BoundAccount {
        let account_id = self
            .ids
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .unwrap_or_else(|| format!("unknown-{username}"));
        BoundAccount {
            account_id,
            username: username.to_string(),
        }
    }

    pub fn bind_org_role(&self, org_id: &str, role: RoleKind, username: &str) {
        let account = self.bound(username);
        let mut state = self.state.lock().unwrap();
        state
            .associations
            .entry(org_id.to_string())
            .or_default()
            .insert(username.to_string());
        state
            .org_roles
            .entry((org_id.to_string(), role))
            .or_default()
            .push(account);
    }

    pub fn bind_space_role(&self, org_id: &str, space_id: &str, role: RoleKind, username: &str) {
        let account = self.bound(username);
        let mut state = self.state.lock().unwrap();
        state
            .associations
            .entry(org_id.to_string())
            .or_default()
            .insert(username.to_string());
        state
            .space_roles
            .entry((space_id.to_string(), role))
            .or_default()
            .push(account);
    }

    pub fn org_role_usernames(&self, org_id: &str, role: RoleKind) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .org_roles
            .get(&(org_id.to_string(), role))
            .map(|v| v.iter().map(|b| b.username.clone()).collect())
            .unwrap_or_default()
    }

    pub fn space_role_usernames(&self, space_id: &str, role: RoleKind) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .space_roles
            .get(&(space_id.to_string(), role))
            .map(|v| v.iter().map(|b| b.username.clone()).collect())
            .unwrap_or_default()
    }

    pub fn is_associated(&self, org_id: &str, username: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .associations
            .get(org_id)
            .is_some_and(|s| s.contains(username))
    }

    pub fn is_registered(&self, account_id: &str) -> bool {
        self.state.lock().unwrap().registered.contains(account_id)
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn check_auth(&self) -> SyncResult<()> {
        if *self.auth_expired.lock().unwrap() {
            return Err(SyncError::AuthExpired);
        }
        Ok(())
    }

    fn check_space(&self, space_id: &str) -> SyncResult<()> {
        if self.failing_spaces.lock().unwrap().contains(space_id) {
            return Err(SyncError::Api {
                status: 500,
                detail: format!("space {space_id} unavailable"),
            });
        }
        Ok(())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlatformService for FakePlatform {
    async fn find_org_by_name(&self, name: &str) -> SyncResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orgs
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_space_by_name(&self, name: &str, org_id: &str) -> SyncResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .spaces
            .get(org_id)
            .map(|spaces| {
                spaces
                    .iter()
                    .filter(|s| s.name == name)
                    .map(|s| s.space_id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_spaces(&self, org_id: &str) -> SyncResult<Vec<SpaceRef>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .spaces
            .get(org_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn register_account(&self, account_id: &str) -> SyncResult<()> {
        self.check_auth()?;
        self.record(format!("register:{account_id}"));
        self.state
            .lock()
            .unwrap()
            .registered
            .insert(account_id.to_string());
        Ok(())
    }

    async fn associate_user_with_org(&self, org_id: &str, username: &str) -> SyncResult<()> {
        self.check_auth()?;
        self.record(format!("associate:{org_id}:{username}"));
        self.state
            .lock()
            .unwrap()
            .associations
            .entry(org_id.to_string())
            .or_default()
            .insert(username.to_string());
        Ok(())
    }

    async fn grant_org_role(
        &self,
        org_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.check_auth()?;
        self.record(format!("grant_org:{org_id}:{role}:{username}"));
        let account = self.bound(username);
        let mut state = self.state.lock().unwrap();
        let bindings = state
            .org_roles
            .entry((org_id.to_string(), role))
            .or_default();
        if !bindings.iter().any(|b| b.username == username) {
            bindings.push(account);
        }
        Ok(())
    }

    async fn revoke_org_role(
        &self,
        org_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.check_auth()?;
        self.record(format!("revoke_org:{org_id}:{role}:{username}"));
        let mut state = self.state.lock().unwrap();
        if let Some(bindings) = state.org_roles.get_mut(&(org_id.to_string(), role)) {
            bindings.retain(|b| b.username != username);
        }
        Ok(())
    }

    async fn grant_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.check_auth()?;
        self.check_space(space_id)?;
        self.record(format!("grant_space:{space_id}:{role}:{username}"));
        let account = self.bound(username);
        let mut state = self.state.lock().unwrap();
        let bindings = state
            .space_roles
            .entry((space_id.to_string(), role))
            .or_default();
        if !bindings.iter().any(|b| b.username == username) {
            bindings.push(account);
        }
        Ok(())
    }

    async fn revoke_space_role(
        &self,
        space_id: &str,
        role: RoleKind,
        username: &str,
    ) -> SyncResult<()> {
        self.check_auth()?;
        self.check_space(space_id)?;
        self.record(format!("revoke_space:{space_id}:{role}:{username}"));
        let mut state = self.state.lock().unwrap();
        if let Some(bindings) = state.space_roles.get_mut(&(space_id.to_string(), role)) {
            bindings.retain(|b| b.username != username);
        }
        Ok(())
    }

    async fn org_role_members(
        &self,
        org_id: &str,
        role: RoleKind,
    ) -> SyncResult<Vec<BoundAccount>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .org_roles
            .get(&(org_id.to_string(), role))
            .cloned()
            .unwrap_or_default())
    }

    async fn space_role_members(
        &self,
        space_id: &str,
        role: RoleKind,
    ) -> SyncResult<Vec<BoundAccount>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .space_roles
            .get(&(space_id.to_string(), role))
            .cloned()
            .unwrap_or_default())
    }

    async fn entitlement_summary(&self, account_id: &str) -> SyncResult<EntitlementSummary> {
        let username = self
            .ids
            .lock()
            .unwrap()
            .iter()
            .find(|(_, id)| id.as_str() == account_id)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| not_found("account"))?;

        let state = self.state.lock().unwrap();
        let holds = |bindings: &HashMap<(String, RoleKind), Vec<BoundAccount>>, role: RoleKind| {
            bindings
                .iter()
                .filter(|((_, r), members)| {
                    *r == role && members.iter().any(|b| b.account_id == account_id)
                })
                .map(|((id, _), _)| id.clone())
                .collect::<Vec<_>>()
        };

        Ok(EntitlementSummary {
            orgs: state
                .associations
                .iter()
                .filter(|(_, users)| users.contains(&username))
                .map(|(org_id, _)| OrgEntitlement {
                    org_id: org_id.clone(),
                    space_ids: state
                        .spaces
                        .get(org_id)
                        .map(|s| s.iter().map(|sp| sp.space_id.clone()).collect())
                        .unwrap_or_default(),
                })
                .collect(),
            managed_org_ids: holds(&state.org_roles, RoleKind::OrgManager),
            billing_org_ids: holds(&state.org_roles, RoleKind::BillingManager),
            audited_org_ids: holds(&state.org_roles, RoleKind::OrgAuditor),
            developer_space_ids: holds(&state.space_roles, RoleKind::SpaceDeveloper),
            managed_space_ids: holds(&state.space_roles, RoleKind::SpaceManager),
            audited_space_ids: holds(&state.space_roles, RoleKind::SpaceAuditor),
        })
    }

    async fn detach_user_from_org(&self, org_id: &str, account_id: &str) -> SyncResult<()> {
        self.check_auth()?;
        self.record(format!("detach:{org_id}:{account_id}"));
        let username = self
            .ids
            .lock()
            .unwrap()
            .iter()
            .find(|(_, id)| id.as_str() == account_id)
            .map(|(name, _)| name.clone());
        if let Some(username) = username {
            if let Some(users) = self.state.lock().unwrap().associations.get_mut(org_id) {
                users.remove(&username);
            }
        }
        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────

/// The three fakes wired to share one username -> account-ID map.
pub struct TestWorld {
    pub directory: Arc<FakeDirectory>,
    pub identity: Arc<FakeIdentity>,
    pub platform: Arc<FakePlatform>,
}

impl TestWorld {
    pub fn new() -> Self {
        let ids = Arc::new(Mutex::new(HashMap::new()));
        Self {
            directory: Arc::new(FakeDirectory::default()),
            identity: Arc::new(FakeIdentity::new(Arc::clone(&ids))),
            platform: Arc::new(FakePlatform::new(ids)),
        }
    }

    pub fn reconciler(&self) -> MembershipReconciler {
        let directory: Arc<dyn DirectoryService> = self.directory.clone();
        let identity: Arc<dyn IdentityService> = self.identity.clone();
        let platform: Arc<dyn PlatformService> = self.platform.clone();
        MembershipReconciler::new(directory, identity, platform, MANAGED_ORIGIN.to_string())
    }

    /// A managed account known to both the identity store and the ID map.
    pub fn managed_user(&self, username: &str) -> String {
        let account_id = format!("u-{}", username.split('@').next().unwrap_or(username));
        self.identity.add_account(&account_id, username, MANAGED_ORIGIN);
        account_id
    }

    /// An account owned by a different identity provider.
    pub fn foreign_user(&self, username: &str, origin: &str) -> String {
        let account_id = format!("u-{}", username.split('@').next().unwrap_or(username));
        self.identity.add_account(&account_id, username, origin);
        account_id
    }
}
