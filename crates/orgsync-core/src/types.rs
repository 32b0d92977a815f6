//! Shared data types exchanged between the clients and the engine.

use serde::{Deserialize, Serialize};

/// A directory group as returned by the group listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryGroup {
    /// Directory-internal group ID.
    pub id: String,
    /// Group email address; encodes the target descriptor.
    pub email: String,
}

/// A platform account reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    /// Platform-internal account ID.
    pub account_id: String,
    /// Username (email address for managed accounts).
    pub username: String,
    /// Identity-provider tag that created the account. Only accounts whose
    /// origin equals the configured managed-SSO origin are owned by the
    /// reconciler.
    pub origin: String,
}

/// An account currently holding a role binding, as returned by the role's
/// binding endpoint (before origin filtering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAccount {
    /// Platform-internal account ID.
    pub account_id: String,
    /// Username.
    pub username: String,
}

/// A space within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRef {
    /// Platform-internal space ID.
    pub space_id: String,
    /// Space name.
    pub name: String,
}

/// One org the account is associated with, including the org's spaces.
///
/// The space list is needed because space-level binding categories carry
/// only space IDs, not the owning org.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgEntitlement {
    /// Org ID.
    pub org_id: String,
    /// IDs of all spaces belonging to this org.
    pub space_ids: Vec<String>,
}

/// An account's full entitlement summary across all orgs and spaces.
///
/// Aggregates the six binding categories the platform reports so callers
/// ask one question, [`EntitlementSummary::has_any_binding_in`], instead
/// of scanning six parallel lists themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSummary {
    /// Orgs the account is associated with (base relation, not a role).
    pub orgs: Vec<OrgEntitlement>,
    /// Org IDs where the account is an org manager.
    pub managed_org_ids: Vec<String>,
    /// Org IDs where the account is a billing manager.
    pub billing_org_ids: Vec<String>,
    /// Org IDs where the account is an org auditor.
    pub audited_org_ids: Vec<String>,
    /// Space IDs where the account is a space developer.
    pub developer_space_ids: Vec<String>,
    /// Space IDs where the account is a space manager.
    pub managed_space_ids: Vec<String>,
    /// Space IDs where the account is a space auditor.
    pub audited_space_ids: Vec<String>,
}

impl EntitlementSummary {
    /// The entry for one org, if the account is associated with it at all.
    #[must_use]
    pub fn org(&self, org_id: &str) -> Option<&OrgEntitlement> {
        self.orgs.iter().find(|o| o.org_id == org_id)
    }

    /// Whether the account still holds any role, org-level or
    /// space-level, within the given org.
    ///
    /// All six categories are checked exhaustively before concluding
    /// `false`; a wrong `false` here would strip a user's org association
    /// while they still hold space access.
    #[must_use]
    pub fn has_any_binding_in(&self, org_id: &str) -> bool {
        let Some(org) = self.org(org_id) else {
            return false;
        };

        let org_id = org_id.to_string();
        if self.managed_org_ids.contains(&org_id)
            || self.billing_org_ids.contains(&org_id)
            || self.audited_org_ids.contains(&org_id)
        {
            return true;
        }

        // Space categories carry bare space IDs; match them against the
        // org's own space list.
        [
            &self.developer_space_ids,
            &self.managed_space_ids,
            &self.audited_space_ids,
        ]
        .into_iter()
        .any(|spaces| spaces.iter().any(|s| org.space_ids.contains(s)))
    }
}
