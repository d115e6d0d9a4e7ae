// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    handler::Handler,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    auth::middleware::{pass_through, require_token},
    error::ApiError,
    models::{Entity, ShareRequest, Sharee, TokenResponse},
    state::AppState,
    telemetry::{access_log, LogSink},
};

pub mod authenticate;
pub mod search;
pub mod shares;

/// Build the service: route table, per-route admission and global layers.
///
/// Every route except the two authenticate endpoints and the `OPTIONS`
/// preflights sits behind the token check, and so do unknown paths and
/// methods: an unauthenticated probe gets 401, never 404.
pub fn router(state: AppState, access: LogSink) -> Router {
    let token = || middleware::from_fn_with_state(state.clone(), require_token);

    let routes = Router::new()
        .route(
            "/swanapi/v1/authenticate",
            get(authenticate::authenticate).layer(middleware::from_fn(pass_through)),
        )
        .route(
            "/swanapi/v2/authenticate",
            get(authenticate::authenticate_oidc),
        )
        .route(
            "/swanapi/v1/shared",
            get(shares::shared)
                .layer(token())
                .options(shares::preflight_get),
        )
        .route(
            "/swanapi/v1/sharing",
            get(shares::sharing)
                .layer(token())
                .options(shares::preflight_get),
        )
        .route(
            "/swanapi/v1/share",
            get(shares::share_details)
                .put(shares::update_share)
                .delete(shares::delete_share)
                .layer(token())
                .options(shares::preflight_share),
        )
        .route(
            "/swanapi/v1/clone",
            post(shares::clone_share)
                .layer(token())
                .options(shares::preflight_clone),
        )
        .route(
            "/swanapi/v1/search/{filter}",
            get(search::search)
                .layer(token())
                .options(shares::preflight_get),
        )
        .fallback(not_found.layer(token()))
        .method_not_allowed_fallback(not_found.layer(token()));

    let deadline = state.config.request_timeout();

    routes
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            deadline,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::from_fn_with_state(access, access_log))
}

/// Unknown path or method.
async fn not_found() -> Response {
    ApiError::not_found("no route").into_response()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "cboxswanapid",
        description = "Sharing API between the SWAN notebook client and CERNBox"
    ),
    paths(
        authenticate::authenticate,
        authenticate::authenticate_oidc,
        shares::shared,
        shares::sharing,
        shares::share_details,
        shares::update_share,
        shares::delete_share,
        shares::clone_share,
        search::search
    ),
    components(schemas(TokenResponse, ShareRequest, Sharee, Entity)),
    tags(
        (name = "Authentication", description = "Session token issuance"),
        (name = "Sharing", description = "Project sharing through the CERNBox share utility"),
        (name = "Search", description = "User and e-group lookup")
    )
)]
pub struct ApiDoc;

/// OpenAPI document of the wire API, as pretty-printed JSON.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}
