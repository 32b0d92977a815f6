//! Resolution of descriptor names into platform IDs.

use std::sync::Arc;

use tracing::debug;

use orgsync_core::{GroupDescriptor, PlatformService, RoleKind, SpaceRef, SyncError, SyncResult};

/// The concrete grant/revoke target a descriptor resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// An org-level role binding.
    Org { org_id: String, role: RoleKind },

    /// A role binding in one named space.
    Space {
        org_id: String,
        space_id: String,
        role: RoleKind,
    },

    /// The fan-out form: the role applies in every space of the org.
    /// The space list is a snapshot taken at resolution time.
    AllSpaces {
        org_id: String,
        spaces: Vec<SpaceRef>,
        role: RoleKind,
    },
}

impl ResolvedTarget {
    /// The org that owns this target.
    #[must_use]
    pub fn org_id(&self) -> &str {
        match self {
            Self::Org { org_id, .. }
            | Self::Space { org_id, .. }
            | Self::AllSpaces { org_id, .. } => org_id,
        }
    }

    /// The role being bound.
    #[must_use]
    pub fn role(&self) -> RoleKind {
        match self {
            Self::Org { role, .. } | Self::Space { role, .. } | Self::AllSpaces { role, .. } => {
                *role
            }
        }
    }
}

/// Resolves org and space names to IDs with exact-name, exactly-one-match
/// semantics.
///
/// Nothing is cached between runs; every run sees the platform's current
/// topology.
#[derive(Clone)]
pub struct OrgSpaceResolver {
    platform: Arc<dyn PlatformService>,
}

impl OrgSpaceResolver {
    pub fn new(platform: Arc<dyn PlatformService>) -> Self {
        Self { platform }
    }

    /// Resolve a parsed descriptor to its concrete target.
    ///
    /// Zero or multiple name matches fail the group; a rename or a
    /// duplicate name must never redirect a role binding to the wrong
    /// place.
    pub async fn resolve(&self, descriptor: &GroupDescriptor) -> SyncResult<ResolvedTarget> {
        let org_matches = self.platform.find_org_by_name(&descriptor.org).await?;
        if org_matches.len() != 1 {
            return Err(SyncError::AmbiguousOrUnknownOrg {
                name: descriptor.org.clone(),
                matches: org_matches.len(),
            });
        }
        let org_id = org_matches.into_iter().next().unwrap_or_default();
        debug!(org = %descriptor.org, org_id = %org_id, "Resolved org");

        if let Some(space_name) = &descriptor.space {
            let space_matches = self
                .platform
                .find_space_by_name(space_name, &org_id)
                .await?;
            if space_matches.len() != 1 {
                return Err(SyncError::AmbiguousOrUnknownSpace {
                    name: space_name.clone(),
                    org_id,
                    matches: space_matches.len(),
                });
            }
            let space_id = space_matches.into_iter().next().unwrap_or_default();
            return Ok(ResolvedTarget::Space {
                org_id,
                space_id,
                role: descriptor.role,
            });
        }

        if descriptor.is_fan_out() {
            let spaces = self.platform.list_spaces(&org_id).await?;
            debug!(org_id = %org_id, spaces = spaces.len(), "Resolved fan-out target");
            return Ok(ResolvedTarget::AllSpaces {
                org_id,
                spaces,
                role: descriptor.role,
            });
        }

        Ok(ResolvedTarget::Org {
            org_id,
            role: descriptor.role,
        })
    }
}
