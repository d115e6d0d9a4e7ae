// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share management endpoints.
//!
//! Every handler checks the caller's origin first and then delegates to the
//! share utility. The utility's stdout is the response body, success or
//! not. Once the origin check has passed, every response (including a 400
//! for a bad parameter) carries `Access-Control-Allow-Origin`.
//!
//! Query values passed on as utility arguments may not start with `-`.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};

use crate::auth::{Auth, AuthenticatedUser};
use crate::cors::{enforce_origin, preflight};
use crate::error::ApiError;
use crate::models::{positional, CloneQuery, ProjectQuery, ShareRequest};
use crate::state::AppState;
use crate::subprocess::Invocation;

#[utoipa::path(
    get,
    path = "/swanapi/v1/shared",
    tag = "Sharing",
    responses(
        (status = 200, description = "Projects shared with the caller (utility output)"),
        (status = 400, description = "Missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn shared(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    let invocation = state.share.run("list-shared-with", [user.username]).await;
    Ok(origin.wrap(invocation))
}

#[utoipa::path(
    get,
    path = "/swanapi/v1/sharing",
    tag = "Sharing",
    responses(
        (status = 200, description = "Projects the caller shares (utility output)"),
        (status = 400, description = "Missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn sharing(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    let invocation = state.share.run("list-shared-by", [user.username]).await;
    Ok(origin.wrap(invocation))
}

#[utoipa::path(
    get,
    path = "/swanapi/v1/share",
    params(ProjectQuery),
    tag = "Sharing",
    responses(
        (status = 200, description = "Sharees of one of the caller's projects (utility output)"),
        (status = 400, description = "Missing project, or missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn share_details(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    Ok(origin.wrap(list_project(&state, &user, &uri).await))
}

async fn list_project(
    state: &AppState,
    user: &AuthenticatedUser,
    uri: &Uri,
) -> Result<Invocation, ApiError> {
    let query = ProjectQuery::from_uri(uri);
    let project = positional(&query.project, "project")?;
    Ok(state
        .share
        .run("list-shared-by", ["--project", project, user.username.as_str()])
        .await)
}

#[utoipa::path(
    put,
    path = "/swanapi/v1/share",
    params(ProjectQuery),
    request_body = ShareRequest,
    tag = "Sharing",
    responses(
        (status = 200, description = "Sharee set replaced (utility output)"),
        (status = 400, description = "Missing project, invalid body, or missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn update_share(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    Ok(origin.wrap(replace_sharees(&state, &user, &uri, &body).await))
}

async fn replace_sharees(
    state: &AppState,
    user: &AuthenticatedUser,
    uri: &Uri,
    body: &[u8],
) -> Result<Invocation, ApiError> {
    let query = ProjectQuery::from_uri(uri);
    let project = positional(&query.project, "project")?;
    let sharees = ShareRequest::from_body(body)?.arguments()?;

    let mut args = vec![user.username.clone(), project.to_string()];
    args.extend(sharees);
    Ok(state.share.run("update-share", args).await)
}

#[utoipa::path(
    delete,
    path = "/swanapi/v1/share",
    params(ProjectQuery),
    tag = "Sharing",
    responses(
        (status = 200, description = "Share removed (utility output)"),
        (status = 400, description = "Missing project, or missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn delete_share(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    Ok(origin.wrap(remove_share(&state, &user, &uri).await))
}

async fn remove_share(
    state: &AppState,
    user: &AuthenticatedUser,
    uri: &Uri,
) -> Result<Invocation, ApiError> {
    let query = ProjectQuery::from_uri(uri);
    let project = positional(&query.project, "project")?;
    Ok(state
        .share
        .run("swan-delete-project-share", [user.username.as_str(), project])
        .await)
}

#[utoipa::path(
    post,
    path = "/swanapi/v1/clone",
    params(CloneQuery),
    tag = "Sharing",
    responses(
        (status = 200, description = "Project cloned into the caller's space (utility output)"),
        (status = 400, description = "Missing parameter, or missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn clone_share(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    Ok(origin.wrap(clone_project(&state, &user, &uri).await))
}

async fn clone_project(
    state: &AppState,
    user: &AuthenticatedUser,
    uri: &Uri,
) -> Result<Invocation, ApiError> {
    let query = CloneQuery::from_uri(uri);
    let sharer = positional(&query.sharer, "sharer")?;
    let project = positional(&query.project, "project")?;
    let destination = positional(&query.destination, "destination")?;
    Ok(state
        .share
        .run(
            "clone-share",
            [sharer, project, user.username.as_str(), destination],
        )
        .await)
}

// =============================================================================
// Preflight
// =============================================================================

pub async fn preflight_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    preflight(&state.origins, &headers, &[Method::GET])
}

pub async fn preflight_share(State(state): State<AppState>, headers: HeaderMap) -> Response {
    preflight(
        &state.origins,
        &headers,
        &[Method::GET, Method::PUT, Method::DELETE],
    )
}

pub async fn preflight_clone(State(state): State<AppState>, headers: HeaderMap) -> Response {
    preflight(&state.origins, &headers, &[Method::POST])
}
