//! Reconciliation engine for directory-driven platform role bindings.
//!
//! Given the three service contracts from `orgsync-core`, the engine
//! turns each directory group into a resolved target, grants the role to
//! every member, revokes it from every managed account holding it without
//! membership, and detaches users whose last role in an org is gone. One
//! call to [`MembershipReconciler::run`] performs a full pass and returns
//! a [`RunReport`].

pub mod binding;
pub mod detachment;
pub mod provisioner;
pub mod reconciler;
pub mod report;
pub mod resolver;

pub use binding::RoleBindingGateway;
pub use detachment::{DetachmentDecision, OrgDetachmentGuard};
pub use provisioner::ShadowAccountProvisioner;
pub use reconciler::MembershipReconciler;
pub use report::{GroupFailure, MemberFailure, RunReport};
pub use resolver::{OrgSpaceResolver, ResolvedTarget};
