//! Grant, revoke, and observation of role bindings.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use orgsync_core::{BoundAccount, PlatformService, RoleKind, SpaceRef, SyncError, SyncResult};

use crate::resolver::ResolvedTarget;

/// Direction of a fan-out operation.
#[derive(Clone, Copy)]
enum FanOutOp {
    Grant,
    Revoke,
}

/// Executes role-binding mutations against a resolved target.
#[derive(Clone)]
pub struct RoleBindingGateway {
    platform: Arc<dyn PlatformService>,
}

impl RoleBindingGateway {
    pub fn new(platform: Arc<dyn PlatformService>) -> Self {
        Self { platform }
    }

    /// Grant the target's role to `username`.
    ///
    /// The org association is established first; a role binding without
    /// it is rejected by the platform. Both steps are idempotent PUTs, so
    /// re-granting an existing binding is a safe no-op.
    pub async fn grant(&self, target: &ResolvedTarget, username: &str) -> SyncResult<()> {
        if let Err(e) = self
            .platform
            .associate_user_with_org(target.org_id(), username)
            .await
        {
            if e.is_fatal() {
                return Err(e);
            }
            return Err(SyncError::AssociationFailed {
                username: username.to_string(),
                org_id: target.org_id().to_string(),
                reason: e.to_string(),
            });
        }

        match target {
            ResolvedTarget::Org { org_id, role } => {
                self.wrap(
                    self.platform.grant_org_role(org_id, *role, username).await,
                    target,
                    username,
                )?;
                info!(org_id = %org_id, role = %role, username = %username, "Granted org role");
            }
            ResolvedTarget::Space { space_id, role, .. } => {
                self.wrap(
                    self.platform
                        .grant_space_role(space_id, *role, username)
                        .await,
                    target,
                    username,
                )?;
                info!(space_id = %space_id, role = %role, username = %username, "Granted space role");
            }
            ResolvedTarget::AllSpaces { spaces, role, .. } => {
                self.fan_out(spaces, *role, username, FanOutOp::Grant).await?;
                info!(
                    spaces = spaces.len(),
                    role = %role,
                    username = %username,
                    "Granted space role across all org spaces"
                );
            }
        }
        Ok(())
    }

    /// Revoke the target's role from `username`.
    pub async fn revoke(&self, target: &ResolvedTarget, username: &str) -> SyncResult<()> {
        match target {
            ResolvedTarget::Org { org_id, role } => {
                self.wrap(
                    self.platform.revoke_org_role(org_id, *role, username).await,
                    target,
                    username,
                )?;
                info!(org_id = %org_id, role = %role, username = %username, "Revoked org role");
            }
            ResolvedTarget::Space { space_id, role, .. } => {
                self.wrap(
                    self.platform
                        .revoke_space_role(space_id, *role, username)
                        .await,
                    target,
                    username,
                )?;
                info!(space_id = %space_id, role = %role, username = %username, "Revoked space role");
            }
            ResolvedTarget::AllSpaces { spaces, role, .. } => {
                self.fan_out(spaces, *role, username, FanOutOp::Revoke).await?;
                info!(
                    spaces = spaces.len(),
                    role = %role,
                    username = %username,
                    "Revoked space role across all org spaces"
                );
            }
        }
        Ok(())
    }

    /// The accounts currently bound to the target's role, before origin
    /// filtering.
    ///
    /// For the fan-out form this is the union over all spaces of the org,
    /// deduplicated by username: holding the role in any one space makes
    /// the user observed.
    pub async fn observed_members(&self, target: &ResolvedTarget) -> SyncResult<Vec<BoundAccount>> {
        match target {
            ResolvedTarget::Org { org_id, role } => {
                self.platform.org_role_members(org_id, *role).await
            }
            ResolvedTarget::Space { space_id, role, .. } => {
                self.platform.space_role_members(space_id, *role).await
            }
            ResolvedTarget::AllSpaces { spaces, role, .. } => {
                let mut seen = HashSet::new();
                let mut union = Vec::new();
                for space in spaces {
                    let members = self
                        .platform
                        .space_role_members(&space.space_id, *role)
                        .await?;
                    for member in members {
                        if seen.insert(member.username.clone()) {
                            union.push(member);
                        }
                    }
                }
                Ok(union)
            }
        }
    }

    /// Apply one operation to every space of a fan-out target.
    ///
    /// Every space is attempted even when earlier ones fail; partial
    /// application with a summary error beats leaving later spaces
    /// untouched. A fatal error still aborts immediately.
    async fn fan_out(
        &self,
        spaces: &[SpaceRef],
        role: RoleKind,
        username: &str,
        op: FanOutOp,
    ) -> SyncResult<()> {
        let mut failures = Vec::new();
        for space in spaces {
            let result = match op {
                FanOutOp::Grant => {
                    self.platform
                        .grant_space_role(&space.space_id, role, username)
                        .await
                }
                FanOutOp::Revoke => {
                    self.platform
                        .revoke_space_role(&space.space_id, role, username)
                        .await
                }
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        space = %space.name,
                        space_id = %space.space_id,
                        username = %username,
                        error = %e,
                        "Fan-out operation failed for one space"
                    );
                    failures.push(format!("{}: {e}", space.name));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SyncError::BindingOperationFailed {
                role,
                username: username.to_string(),
                reason: format!(
                    "{} of {} spaces failed: {}",
                    failures.len(),
                    spaces.len(),
                    failures.join("; ")
                ),
            })
        }
    }

    fn wrap(
        &self,
        result: SyncResult<()>,
        target: &ResolvedTarget,
        username: &str,
    ) -> SyncResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Err(SyncError::BindingOperationFailed {
                role: target.role(),
                username: username.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
