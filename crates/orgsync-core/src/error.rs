//! Error taxonomy for a reconciliation run.

use thiserror::Error;

use crate::role::RoleKind;

/// Result type alias for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while reconciling directory groups against
/// platform role bindings.
///
/// Per-member and per-group errors are caught at the smallest enclosing
/// loop and recorded in the run report; only [`SyncError::AuthExpired`]
/// aborts the whole run (see [`SyncError::is_fatal`]).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Group identifier does not follow the naming convention.
    #[error("'{identifier}' is not a valid group identifier")]
    MalformedIdentifier { identifier: String },

    /// Exact-name org lookup did not return exactly one match.
    #[error("search for org '{name}' returned {matches} matches, expected exactly 1")]
    AmbiguousOrUnknownOrg { name: String, matches: usize },

    /// Exact-name space lookup did not return exactly one match.
    #[error("search for space '{name}' in org {org_id} returned {matches} matches, expected exactly 1")]
    AmbiguousOrUnknownSpace {
        name: String,
        org_id: String,
        matches: usize,
    },

    /// Identity search by exact username returned more than one account.
    #[error("search for user '{username}' returned more than one identity")]
    AmbiguousIdentity { username: String },

    /// Shadow account creation or registration failed.
    #[error("could not provision account for '{username}': {reason}")]
    ProvisioningFailed { username: String, reason: String },

    /// Associating the account with the owning org failed.
    #[error("could not associate '{username}' with org {org_id}: {reason}")]
    AssociationFailed {
        username: String,
        org_id: String,
        reason: String,
    },

    /// A grant or revoke operation failed.
    #[error("{role} binding operation failed for '{username}': {reason}")]
    BindingOperationFailed {
        role: RoleKind,
        username: String,
        reason: String,
    },

    /// Detaching the account from the org failed.
    #[error("could not detach '{username}' from org {org_id}: {reason}")]
    DetachmentFailed {
        username: String,
        org_id: String,
        reason: String,
    },

    /// Access token expired and the single refresh-and-retry did not
    /// recover. Continuing would silently skip all remaining work.
    #[error("access token expired and could not be refreshed")]
    AuthExpired,

    /// Network-level HTTP failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Backend returned a non-success status.
    #[error("API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client-side configuration problem.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Whether this error must abort the whole run instead of being
    /// recorded and skipped at the enclosing loop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}
