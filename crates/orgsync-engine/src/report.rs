//! Per-run outcome accounting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A group that could not be reconciled at all.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    /// The group's email identifier as the directory reported it.
    pub identifier: String,
    /// Rendered error.
    pub error: String,
}

/// A per-member operation that failed while the rest of the group
/// continued.
#[derive(Debug, Clone, Serialize)]
pub struct MemberFailure {
    /// The group being reconciled.
    pub group: String,
    /// The member the operation was for.
    pub username: String,
    /// Rendered error.
    pub error: String,
}

/// Everything one reconciliation run did and failed to do.
///
/// Malformed identifiers are kept apart from backend failures: the former
/// point at a directory naming mistake, the latter at the platform.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Groups for which reconciliation was attempted.
    pub groups_processed: usize,
    /// Successful grant operations (including idempotent re-grants).
    pub grants: usize,
    /// Successful revoke operations.
    pub revocations: usize,
    /// Org associations removed by the detachment guard.
    pub detachments: usize,
    /// Groups skipped because their identifier does not parse.
    pub malformed_groups: Vec<GroupFailure>,
    /// Groups skipped because resolution or member listing failed.
    pub failed_groups: Vec<GroupFailure>,
    /// Individual member operations that failed.
    pub member_failures: Vec<MemberFailure>,
    /// Groups not attempted because the run deadline passed.
    pub deadline_skipped: usize,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            groups_processed: 0,
            grants: 0,
            revocations: 0,
            detachments: 0,
            malformed_groups: Vec::new(),
            failed_groups: Vec::new(),
            member_failures: Vec::new(),
            deadline_skipped: 0,
        }
    }

    /// Mark the run finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whether the run completed without any recorded failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.malformed_groups.is_empty()
            && self.failed_groups.is_empty()
            && self.member_failures.is_empty()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "run {}: {} groups, {} grants, {} revocations, {} detachments",
            self.run_id, self.groups_processed, self.grants, self.revocations, self.detachments
        )?;
        if self.deadline_skipped > 0 {
            writeln!(f, "  {} groups skipped at deadline", self.deadline_skipped)?;
        }
        for g in &self.malformed_groups {
            writeln!(f, "  malformed: {} ({})", g.identifier, g.error)?;
        }
        for g in &self.failed_groups {
            writeln!(f, "  failed group: {} ({})", g.identifier, g.error)?;
        }
        for m in &self.member_failures {
            writeln!(f, "  failed member: {} in {} ({})", m.username, m.group, m.error)?;
        }
        Ok(())
    }
}
