//! Shadow account provisioning for members seen first in the directory.

use std::sync::Arc;

use tracing::{info, warn};

use orgsync_core::{IdentityService, PlatformService, SyncError, SyncResult};

/// Ensures every directory member has a platform account before any role
/// binding is attempted.
///
/// Provisioning creates the identity tagged with the managed-SSO origin
/// and registers it in the platform's account registry. It never assigns
/// a role; a provisioned user who signs in has no access until a binding
/// grants it.
#[derive(Clone)]
pub struct ShadowAccountProvisioner {
    identity: Arc<dyn IdentityService>,
    platform: Arc<dyn PlatformService>,
    managed_origin: String,
}

impl ShadowAccountProvisioner {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        platform: Arc<dyn PlatformService>,
        managed_origin: String,
    ) -> Self {
        Self {
            identity,
            platform,
            managed_origin,
        }
    }

    /// Return the account ID for `username`, creating the account if it
    /// does not exist yet. Idempotent: an existing account is returned
    /// as-is regardless of its origin.
    pub async fn ensure_account(&self, username: &str) -> SyncResult<String> {
        let matches = self.identity.find_by_username(username).await?;
        match matches.len() {
            1 => Ok(matches.into_iter().next().map(|m| m.account_id).unwrap_or_default()),
            0 => self.provision(username).await,
            n => {
                warn!(username = %username, matches = n, "Ambiguous identity, refusing to act");
                Err(SyncError::AmbiguousIdentity {
                    username: username.to_string(),
                })
            }
        }
    }

    async fn provision(&self, username: &str) -> SyncResult<String> {
        let account_id = match self
            .identity
            .create_account(username, &self.managed_origin)
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                return Err(SyncError::ProvisioningFailed {
                    username: username.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if let Err(e) = self.platform.register_account(&account_id).await {
            if e.is_fatal() {
                return Err(e);
            }
            return Err(SyncError::ProvisioningFailed {
                username: username.to_string(),
                reason: format!("account registry rejected {account_id}: {e}"),
            });
        }

        info!(
            username = %username,
            account_id = %account_id,
            origin = %self.managed_origin,
            "Provisioned shadow account"
        );
        Ok(account_id)
    }
}
