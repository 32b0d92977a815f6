//! Org detachment after a user's last role in the org is revoked.

use std::sync::Arc;

use tracing::{debug, info};

use orgsync_core::{BoundAccount, PlatformService, SyncError, SyncResult};

/// The outcome of a detachment evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachmentDecision {
    /// The account has no association with the org; nothing to do.
    NotAssociated,
    /// The account still holds at least one role in the org; the
    /// association stays.
    Retained,
    /// The association was removed.
    Detached,
}

/// Decides whether a user whose role was just revoked should also lose
/// the org association, and performs the detachment when safe.
///
/// The association is removed only when no role in any of the six binding
/// categories remains within the org. Holding even a single space-level
/// role keeps the association; detaching would break that access.
#[derive(Clone)]
pub struct OrgDetachmentGuard {
    platform: Arc<dyn PlatformService>,
}

impl OrgDetachmentGuard {
    pub fn new(platform: Arc<dyn PlatformService>) -> Self {
        Self { platform }
    }

    /// Evaluate and, when safe, detach `account` from `org_id`.
    pub async fn evaluate(
        &self,
        org_id: &str,
        account: &BoundAccount,
    ) -> SyncResult<DetachmentDecision> {
        let summary = self.platform.entitlement_summary(&account.account_id).await?;

        if summary.org(org_id).is_none() {
            debug!(org_id = %org_id, username = %account.username, "No association to detach");
            return Ok(DetachmentDecision::NotAssociated);
        }

        if summary.has_any_binding_in(org_id) {
            debug!(
                org_id = %org_id,
                username = %account.username,
                "Association retained, other roles remain"
            );
            return Ok(DetachmentDecision::Retained);
        }

        match self
            .platform
            .detach_user_from_org(org_id, &account.account_id)
            .await
        {
            Ok(()) => {
                info!(org_id = %org_id, username = %account.username, "Detached user from org");
                Ok(DetachmentDecision::Detached)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Err(SyncError::DetachmentFailed {
                username: account.username.clone(),
                org_id: org_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
