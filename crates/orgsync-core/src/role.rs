//! The closed enumeration of platform roles.

use serde::{Deserialize, Serialize};

/// A role that can be bound at the organization or space level.
///
/// Each variant knows its own resource-path segment and whether it applies
/// to an org or a space, so callers dispatch with an exhaustive `match`
/// instead of a string map that silently yields nothing for unknown keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Organization manager.
    OrgManager,
    /// Organization billing manager.
    BillingManager,
    /// Organization auditor.
    OrgAuditor,
    /// Space manager.
    SpaceManager,
    /// Space developer.
    SpaceDeveloper,
    /// Space auditor.
    SpaceAuditor,
}

impl RoleKind {
    /// Parse a role keyword as it appears in a group identifier.
    ///
    /// Keywords are matched exactly; no case normalization is performed.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "orgmanager" => Some(Self::OrgManager),
            "billingmanager" => Some(Self::BillingManager),
            "auditor" => Some(Self::OrgAuditor),
            "spacemanager" => Some(Self::SpaceManager),
            "spacedeveloper" => Some(Self::SpaceDeveloper),
            "spaceauditor" => Some(Self::SpaceAuditor),
            _ => None,
        }
    }

    /// The keyword used for this role in group identifiers.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::OrgManager => "orgmanager",
            Self::BillingManager => "billingmanager",
            Self::OrgAuditor => "auditor",
            Self::SpaceManager => "spacemanager",
            Self::SpaceDeveloper => "spacedeveloper",
            Self::SpaceAuditor => "spaceauditor",
        }
    }

    /// Whether this role applies at the space level.
    #[must_use]
    pub fn is_space_role(&self) -> bool {
        matches!(
            self,
            Self::SpaceManager | Self::SpaceDeveloper | Self::SpaceAuditor
        )
    }

    /// The sub-resource segment under the owning org or space.
    ///
    /// Grants are issued against `.../{segment}`, revocations against
    /// `.../{segment}/remove`.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::OrgManager | Self::SpaceManager => "managers",
            Self::BillingManager => "billing_managers",
            Self::OrgAuditor | Self::SpaceAuditor => "auditors",
            Self::SpaceDeveloper => "developers",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}
