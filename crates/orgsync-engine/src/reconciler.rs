//! The reconciliation loop: desired state from the directory, observed
//! state from the platform, mutations to close the gap.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use orgsync_core::{
    BoundAccount, DirectoryGroup, DirectoryService, GroupDescriptor, IdentityService,
    PlatformService, SyncResult,
};

use crate::binding::RoleBindingGateway;
use crate::detachment::{DetachmentDecision, OrgDetachmentGuard};
use crate::provisioner::ShadowAccountProvisioner;
use crate::report::{GroupFailure, MemberFailure, RunReport};
use crate::resolver::{OrgSpaceResolver, ResolvedTarget};

/// Drives one reconciliation run over all matching directory groups.
///
/// The run is convergence-oriented: every error smaller than a dead
/// platform is caught at the smallest enclosing loop, recorded in the
/// [`RunReport`], and the run moves on. Only a fatal error (an access
/// token that cannot be refreshed) aborts the run, because continuing
/// would silently skip everything that remains.
pub struct MembershipReconciler {
    directory: Arc<dyn DirectoryService>,
    identity: Arc<dyn IdentityService>,
    resolver: OrgSpaceResolver,
    provisioner: ShadowAccountProvisioner,
    gateway: RoleBindingGateway,
    guard: OrgDetachmentGuard,
    managed_origin: String,
}

impl MembershipReconciler {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        identity: Arc<dyn IdentityService>,
        platform: Arc<dyn PlatformService>,
        managed_origin: String,
    ) -> Self {
        Self {
            directory,
            identity: Arc::clone(&identity),
            resolver: OrgSpaceResolver::new(Arc::clone(&platform)),
            provisioner: ShadowAccountProvisioner::new(
                identity,
                Arc::clone(&platform),
                managed_origin.clone(),
            ),
            gateway: RoleBindingGateway::new(Arc::clone(&platform)),
            guard: OrgDetachmentGuard::new(platform),
            managed_origin,
        }
    }

    /// Reconcile every group whose identifier matches `query`.
    ///
    /// With a `deadline`, groups not yet started when it passes are
    /// skipped and counted; an operation already in flight completes.
    pub async fn run(&self, query: &str, deadline: Option<Duration>) -> SyncResult<RunReport> {
        let mut report = RunReport::new();
        let deadline_at = deadline.map(|d| Instant::now() + d);

        let groups = self.directory.list_groups(query).await?;
        info!(run_id = %report.run_id, groups = groups.len(), query = %query, "Starting reconciliation run");

        let mut remaining = groups.len();
        for group in &groups {
            if let Some(at) = deadline_at {
                if Instant::now() >= at {
                    warn!(skipped = remaining, "Run deadline passed, skipping remaining groups");
                    report.deadline_skipped = remaining;
                    break;
                }
            }
            remaining -= 1;
            self.reconcile_group(group, &mut report).await?;
        }

        report.finish();
        info!(
            run_id = %report.run_id,
            groups = report.groups_processed,
            grants = report.grants,
            revocations = report.revocations,
            detachments = report.detachments,
            clean = report.is_clean(),
            "Reconciliation run finished"
        );
        Ok(report)
    }

    /// Reconcile one group. Returns `Err` only for fatal errors; every
    /// group-scoped failure lands in the report instead.
    async fn reconcile_group(
        &self,
        group: &DirectoryGroup,
        report: &mut RunReport,
    ) -> SyncResult<()> {
        report.groups_processed += 1;

        let descriptor = match GroupDescriptor::parse(&group.email) {
            Ok(d) => d,
            Err(e) => {
                warn!(group = %group.email, error = %e, "Skipping group with malformed identifier");
                report.malformed_groups.push(GroupFailure {
                    identifier: group.email.clone(),
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        let target = match self.resolver.resolve(&descriptor).await {
            Ok(t) => t,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(group = %group.email, error = %e, "Skipping group, target did not resolve");
                report.failed_groups.push(GroupFailure {
                    identifier: group.email.clone(),
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        let desired = match self.directory.list_members(&group.id).await {
            Ok(members) => members,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(group = %group.email, error = %e, "Skipping group, member listing failed");
                report.failed_groups.push(GroupFailure {
                    identifier: group.email.clone(),
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        info!(
            group = %group.email,
            org = %descriptor.org,
            role = %descriptor.role,
            members = desired.len(),
            "Reconciling group"
        );

        self.grant_phase(group, &target, &desired, report).await?;
        self.revoke_phase(group, &target, &desired, report).await?;
        Ok(())
    }

    /// Ensure every desired member has an account and holds the role.
    async fn grant_phase(
        &self,
        group: &DirectoryGroup,
        target: &ResolvedTarget,
        desired: &[String],
        report: &mut RunReport,
    ) -> SyncResult<()> {
        for username in desired {
            if let Err(e) = self.grant_member(target, username).await {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(group = %group.email, username = %username, error = %e, "Grant failed");
                report.member_failures.push(MemberFailure {
                    group: group.email.clone(),
                    username: username.clone(),
                    error: e.to_string(),
                });
            } else {
                report.grants += 1;
            }
        }
        Ok(())
    }

    async fn grant_member(&self, target: &ResolvedTarget, username: &str) -> SyncResult<()> {
        self.provisioner.ensure_account(username).await?;
        self.gateway.grant(target, username).await
    }

    /// Revoke the role from every managed account that holds it without
    /// being in the group, then detach where no role remains.
    async fn revoke_phase(
        &self,
        group: &DirectoryGroup,
        target: &ResolvedTarget,
        desired: &[String],
        report: &mut RunReport,
    ) -> SyncResult<()> {
        let observed = match self.gateway.observed_members(target).await {
            Ok(members) => members,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(group = %group.email, error = %e, "Could not list current role holders");
                report.failed_groups.push(GroupFailure {
                    identifier: group.email.clone(),
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();
        for account in &observed {
            if desired_set.contains(account.username.as_str()) {
                continue;
            }
            match self.revoke_member(group, target, account, report).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        group = %group.email,
                        username = %account.username,
                        error = %e,
                        "Revoke failed"
                    );
                    report.member_failures.push(MemberFailure {
                        group: group.email.clone(),
                        username: account.username.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Revoke one unauthorized holder, but only if the account belongs to
    /// the managed-SSO origin. Accounts from any other identity provider
    /// are never touched.
    async fn revoke_member(
        &self,
        group: &DirectoryGroup,
        target: &ResolvedTarget,
        account: &BoundAccount,
        report: &mut RunReport,
    ) -> SyncResult<()> {
        let identity = self.identity.find_by_account_id(&account.account_id).await?;
        if identity.origin != self.managed_origin {
            return Ok(());
        }

        info!(
            group = %group.email,
            username = %account.username,
            role = %target.role(),
            "Revoking unauthorized role holder"
        );
        self.gateway.revoke(target, &account.username).await?;
        report.revocations += 1;

        if self.guard.evaluate(target.org_id(), account).await? == DetachmentDecision::Detached {
            report.detachments += 1;
        }
        Ok(())
    }
}
