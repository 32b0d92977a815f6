//! HTTP clients implementing the `orgsync-core` service traits.
//!
//! One client per backend: [`DirectoryClient`] for the group directory,
//! [`IdentityClient`] for the identity store, and [`PlatformClient`] for
//! the platform API. All three share a [`TokenProvider`] style of
//! authentication and the single refresh-and-retry behavior on 401.

pub mod auth;
pub mod directory;
pub mod identity;
pub mod platform;
mod request;

pub use auth::{PlatformCredentials, TokenProvider};
pub use directory::DirectoryClient;
pub use identity::IdentityClient;
pub use platform::PlatformClient;

use std::time::Duration;

use orgsync_core::{SyncError, SyncResult};

/// Build the shared HTTP client with a bounded request timeout.
pub fn build_http_client(timeout: Duration) -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("orgsync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SyncError::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

/// Map a transport-level reqwest failure into the shared taxonomy.
pub(crate) fn transport(e: reqwest::Error) -> SyncError {
    SyncError::Network {
        message: e.to_string(),
    }
}
