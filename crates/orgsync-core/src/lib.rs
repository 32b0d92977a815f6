//! Core domain model for the orgsync reconciler.
//!
//! This crate defines the vocabulary shared by the HTTP clients and the
//! reconciliation engine:
//!
//! - [`RoleKind`]: the closed set of org- and space-level roles, each
//!   carrying its resource-path segment.
//! - [`GroupDescriptor`]: the `{org, space, role}` target state parsed
//!   from a directory group identifier.
//! - [`SyncError`]: the error taxonomy for a reconciliation run.
//! - Service traits ([`DirectoryService`], [`IdentityService`],
//!   [`PlatformService`]): the contracts the engine consumes, implemented
//!   over HTTP by `orgsync-client` and by in-memory fakes in tests.

pub mod descriptor;
pub mod error;
pub mod role;
pub mod services;
pub mod types;

pub use descriptor::GroupDescriptor;
pub use error::{SyncError, SyncResult};
pub use role::RoleKind;
pub use services::{DirectoryService, IdentityService, PlatformService};
pub use types::{
    AccountRef, BoundAccount, DirectoryGroup, EntitlementSummary, OrgEntitlement, SpaceRef,
};
