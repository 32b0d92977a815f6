//! Parsing group identifiers into target-state descriptors.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::role::RoleKind;

/// Fixed token separator in group identifiers.
pub const TOKEN_SEPARATOR: &str = "__";

/// The target state encoded in one directory group's name.
///
/// Parsed once per group and discarded after one reconciliation pass.
/// Invariant: `space` is `None` iff `role` is an org-level role, with one
/// exception: a space-less [`RoleKind::SpaceDeveloper`] descriptor means
/// "developer in every space of the org" (fan-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    /// Organization name (exact, as the platform knows it).
    pub org: String,
    /// Space name for space-level roles; `None` for org-level roles and
    /// the fan-out form.
    pub space: Option<String>,
    /// The role this group maps to.
    pub role: RoleKind,
}

impl GroupDescriptor {
    /// Parse a group identifier of the form `<prefix>__<org>__<role>` or
    /// `<prefix>__<org>__<space>__<role>`.
    ///
    /// Any `@domain` suffix is stripped before splitting. Wrong token
    /// counts, empty tokens, unknown role keywords, and role keywords on
    /// the wrong level all fail with [`SyncError::MalformedIdentifier`];
    /// the caller skips the group and continues the run.
    pub fn parse(identifier: &str) -> SyncResult<Self> {
        let malformed = || SyncError::MalformedIdentifier {
            identifier: identifier.to_string(),
        };

        let mailbox = identifier.split('@').next().unwrap_or(identifier);
        let tokens: Vec<&str> = mailbox.split(TOKEN_SEPARATOR).collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(malformed());
        }

        match tokens.as_slice() {
            [_prefix, org, keyword] => {
                let role = RoleKind::from_keyword(keyword).ok_or_else(malformed)?;
                // Three tokens carry org-level roles, plus the space-less
                // SpaceDeveloper fan-out form.
                if role.is_space_role() && role != RoleKind::SpaceDeveloper {
                    return Err(malformed());
                }
                Ok(Self {
                    org: (*org).to_string(),
                    space: None,
                    role,
                })
            }
            [_prefix, org, space, keyword] => {
                let role = RoleKind::from_keyword(keyword).ok_or_else(malformed)?;
                if !role.is_space_role() {
                    return Err(malformed());
                }
                Ok(Self {
                    org: (*org).to_string(),
                    space: Some((*space).to_string()),
                    role,
                })
            }
            _ => Err(malformed()),
        }
    }

    /// Whether this descriptor fans out over every space of the org.
    #[must_use]
    pub fn is_fan_out(&self) -> bool {
        self.space.is_none() && self.role == RoleKind::SpaceDeveloper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_tokens_org_roles() {
        for (keyword, role) in [
            ("orgmanager", RoleKind::OrgManager),
            ("billingmanager", RoleKind::BillingManager),
            ("auditor", RoleKind::OrgAuditor),
        ] {
            let d = GroupDescriptor::parse(&format!("sso__acme__{keyword}")).unwrap();
            assert_eq!(d.org, "acme");
            assert_eq!(d.space, None);
            assert_eq!(d.role, role);
            assert!(!d.is_fan_out());
        }
    }

    #[test]
    fn test_four_tokens_space_roles() {
        for (keyword, role) in [
            ("spacemanager", RoleKind::SpaceManager),
            ("spacedeveloper", RoleKind::SpaceDeveloper),
            ("spaceauditor", RoleKind::SpaceAuditor),
        ] {
            let d = GroupDescriptor::parse(&format!("sso__acme__dev__{keyword}")).unwrap();
            assert_eq!(d.org, "acme");
            assert_eq!(d.space.as_deref(), Some("dev"));
            assert_eq!(d.role, role);
            assert!(!d.is_fan_out());
        }
    }

    #[test]
    fn test_domain_suffix_stripped() {
        let d = GroupDescriptor::parse("sso__acme__dev__spacedeveloper@example.com").unwrap();
        assert_eq!(d.org, "acme");
        assert_eq!(d.space.as_deref(), Some("dev"));
    }

    #[test]
    fn test_space_less_developer_fans_out() {
        let d = GroupDescriptor::parse("sso__acme__spacedeveloper").unwrap();
        assert_eq!(d.space, None);
        assert_eq!(d.role, RoleKind::SpaceDeveloper);
        assert!(d.is_fan_out());
    }

    #[test]
    fn test_wrong_token_count_rejected() {
        for identifier in [
            "sso",
            "sso__acme",
            "sso__acme__dev__qa__spacedeveloper",
            "",
        ] {
            assert!(matches!(
                GroupDescriptor::parse(identifier),
                Err(SyncError::MalformedIdentifier { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        assert!(matches!(
            GroupDescriptor::parse("sso__acme__root"),
            Err(SyncError::MalformedIdentifier { .. })
        ));
        assert!(matches!(
            GroupDescriptor::parse("sso__acme__dev__admin"),
            Err(SyncError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn test_role_on_wrong_level_rejected() {
        // Space-only keywords (other than the fan-out form) need a space token.
        assert!(GroupDescriptor::parse("sso__acme__spacemanager").is_err());
        assert!(GroupDescriptor::parse("sso__acme__spaceauditor").is_err());
        // Org keywords cannot carry a space token.
        assert!(GroupDescriptor::parse("sso__acme__dev__orgmanager").is_err());
        assert!(GroupDescriptor::parse("sso__acme__dev__auditor").is_err());
    }

    #[test]
    fn test_empty_tokens_rejected() {
        assert!(GroupDescriptor::parse("sso____orgmanager").is_err());
        assert!(GroupDescriptor::parse("__acme__orgmanager").is_err());
    }

    #[test]
    fn test_case_is_not_normalized() {
        assert!(GroupDescriptor::parse("sso__acme__OrgManager").is_err());
    }
}
