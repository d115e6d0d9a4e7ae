// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance.
//!
//! The browser opens the authenticate URL in a hidden frame. The response is
//! a one-line page that hands the token to the parent window with
//! `postMessage`, targeted at the canonical origin of the `Origin` query
//! parameter.

use axum::{
    extract::State,
    http::{
        header::{CONTENT_TYPE, X_FRAME_OPTIONS},
        HeaderMap, HeaderValue, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use url::Url;

use crate::auth::{middleware::bearer_token, AuthError};
use crate::error::ApiError;
use crate::models::{required, AuthenticateQuery, TokenResponse};
use crate::origin::canonical_origin;
use crate::state::AppState;

/// Header the SSO proxy injects with the authenticated login name.
pub const SSO_LOGIN_HEADER: &str = "adfs_login";

#[utoipa::path(
    get,
    path = "/swanapi/v1/authenticate",
    params(
        AuthenticateQuery,
        ("adfs_login" = String, Header, description = "Login name injected by the SSO proxy")
    ),
    tag = "Authentication",
    responses(
        (status = 200, description = "postMessage bridge page carrying a TokenResponse", content_type = "text/html"),
        (status = 204, description = "Called from the SSO login page; the handshake continues there"),
        (status = 400, description = "Missing login, missing or disallowed origin")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let subject = headers
        .get(SSO_LOGIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("request header adfs_login is empty or not set"))?;

    issue_to_origin(&state, subject, &uri)
}

#[utoipa::path(
    get,
    path = "/swanapi/v2/authenticate",
    params(AuthenticateQuery),
    tag = "Authentication",
    responses(
        (status = 200, description = "postMessage bridge page carrying a TokenResponse", content_type = "text/html"),
        (status = 204, description = "Called from the SSO login page; the handshake continues there"),
        (status = 400, description = "Missing or disallowed origin"),
        (status = 401, description = "Missing or invalid ID token")
    )
)]
pub async fn authenticate_oidc(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let verifier = state
        .oidc
        .as_ref()
        .ok_or_else(|| ApiError::unauthorized("OIDC authentication is disabled"))?;

    let id_token = bearer_token(&headers)?;
    let subject = verifier.verify(id_token).await?;

    issue_to_origin(&state, &subject, &uri)
}

/// Issue a token for `subject` and wrap it in the bridge page.
fn issue_to_origin(state: &AppState, subject: &str, uri: &Uri) -> Result<Response, ApiError> {
    let query = AuthenticateQuery::from_uri(uri);
    let raw = required(&query.origin, "Origin")?;
    let url = Url::parse(raw).map_err(|e| ApiError::bad_request(format!("invalid Origin {raw:?}: {e}")))?;

    if canonical_origin(&url) == state.config.shibreferer {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let origin = state.origins.check(&url).ok_or_else(|| {
        ApiError::bad_request(format!(
            "origin {raw:?} does not match allowfrom pattern {:?}",
            state.origins.pattern()
        ))
    })?;

    let issued = state
        .tokens
        .issue(subject)
        .map_err(|e: AuthError| ApiError::internal(format!("token signing failed: {e}")))?;
    let payload = serde_json::to_string(&TokenResponse::new(issued.token, issued.expires_at))
        .map_err(|e| ApiError::internal(format!("token serialization failed: {e}")))?;
    let frame_options = HeaderValue::from_str(&format!("ALLOW-FROM {origin}"))
        .map_err(|e| ApiError::internal(format!("invalid origin header value: {e}")))?;

    tracing::info!(username = %subject, origin = %origin, "token issued");

    Ok((
        StatusCode::OK,
        [
            (
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            ),
            (X_FRAME_OPTIONS, frame_options),
        ],
        format!("<script>parent.postMessage({payload}, '{origin}');</script>"),
    )
        .into_response())
}
