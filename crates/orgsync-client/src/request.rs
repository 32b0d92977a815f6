//! Authorized request execution with the single refresh-and-retry policy.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use orgsync_core::{SyncError, SyncResult};

use crate::auth::TokenProvider;
use crate::transport;

/// Send an authorized request.
///
/// On a 401 the cached token is dropped, the credentials are refreshed,
/// and the request is replayed exactly once. A second 401 means the
/// credentials themselves are no longer usable; that surfaces as the
/// fatal [`SyncError::AuthExpired`].
pub(crate) async fn send_authorized(
    auth: &TokenProvider,
    builder: RequestBuilder,
) -> SyncResult<Response> {
    let replay = builder
        .try_clone()
        .ok_or_else(|| SyncError::InvalidConfig("request body is not replayable".into()))?;

    let token = auth.bearer_token().await?;
    let response = builder.bearer_auth(token).send().await.map_err(transport)?;
    if response.status() != StatusCode::UNAUTHORIZED {
        return Ok(response);
    }

    warn!("Request rejected with 401, refreshing token and retrying once");
    auth.invalidate().await;
    let token = auth.refresh().await?;
    let response = replay.bearer_auth(token).send().await.map_err(transport)?;
    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(SyncError::AuthExpired);
    }
    Ok(response)
}

/// Send an authorized request and decode a JSON body from a 2xx response.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    auth: &TokenProvider,
    builder: RequestBuilder,
) -> SyncResult<T> {
    let response = send_authorized(auth, builder).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(api_error(status, response).await);
    }
    let body = response.text().await.map_err(transport)?;
    debug!(status = status.as_u16(), "Decoding response body");
    Ok(serde_json::from_str(&body)?)
}

/// Send an authorized request expecting a 2xx response; the body is
/// discarded. Both 200 and 204 are acceptable success codes.
pub(crate) async fn expect_success(
    auth: &TokenProvider,
    builder: RequestBuilder,
) -> SyncResult<()> {
    let response = send_authorized(auth, builder).await?;
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status.is_success() {
        return Ok(());
    }
    Err(api_error(status, response).await)
}

/// Build the [`SyncError::Api`] for a non-success response.
pub(crate) async fn api_error(status: StatusCode, response: Response) -> SyncError {
    let detail = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    SyncError::Api {
        status: status.as_u16(),
        detail,
    }
}
