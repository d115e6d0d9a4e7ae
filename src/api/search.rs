// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group search proxy.
//!
//! `GET /swanapi/v1/search/{filter}` is forwarded to the CERNBox group
//! search daemon as `GET <cboxgroupdurl>/<filter>`. Status, body and
//! `Content-Type` of the upstream answer are copied to the client.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::auth::Auth;
use crate::cors::enforce_origin;
use crate::error::{ApiError, Error, Result};
use crate::state::AppState;

/// Outbound request timeout.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the group search daemon.
#[derive(Clone)]
pub struct GroupSearch {
    client: reqwest::Client,
    base: Url,
    secret: String,
}

impl GroupSearch {
    pub fn new(base: &str, secret: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::Config(format!("invalid cboxgroupdurl: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("cboxgroupdurl {base} cannot carry a path")));
        }
        let client = reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            secret: secret.to_string(),
        })
    }

    /// Upstream URL for a filter: the filter becomes one path segment.
    pub fn url_for(&self, filter: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(filter);
        }
        url
    }

    /// Forward a search and relay the upstream answer.
    pub async fn query(&self, filter: &str) -> std::result::Result<Response, ApiError> {
        let url = self.url_for(filter);
        let upstream = self
            .client
            .get(url.clone())
            .bearer_auth(&self.secret)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("group search request to {url} failed: {e}")))?;

        let status = upstream.status();
        let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
        let body = upstream
            .bytes()
            .await
            .map_err(|e| ApiError::internal(format!("group search response from {url} failed: {e}")))?;

        tracing::debug!(url = %url, status = status.as_u16(), bytes = body.len(), "group search answered");

        let mut response = (status, Body::from(body)).into_response();
        if let Some(value) = content_type {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        Ok(response)
    }
}

#[utoipa::path(
    get,
    path = "/swanapi/v1/search/{filter}",
    params(
        ("filter" = String, Path, description = "Search term forwarded to the group search daemon")
    ),
    tag = "Search",
    responses(
        (status = 200, description = "Upstream search result, relayed verbatim"),
        (status = 400, description = "Missing or disallowed Origin"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Group search daemon unreachable")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(filter): Path<String>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    let origin = enforce_origin(&state.origins, &headers)?;
    Ok(origin.wrap(state.search.query(&filter).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bind_local, spawn_server};
    use axum::{
        http::{header::AUTHORIZATION, StatusCode},
        routing::get,
        Router,
    };

    async fn spawn_groupd() -> String {
        let (listener, base) = bind_local().await;
        let app = Router::new().route(
            "/api/v1/search/{filter}",
            get(|Path(filter): Path<String>, headers: HeaderMap| async move {
                let authorization = headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if authorization != "Bearer groupd-secret" {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                (
                    StatusCode::OK,
                    [(CONTENT_TYPE, "application/json")],
                    format!(r#"[{{"filter":"{filter}"}}]"#),
                )
                    .into_response()
            }),
        );
        spawn_server(listener, app);
        format!("{base}/api/v1/search")
    }

    #[test]
    fn filter_is_one_encoded_segment() {
        let search = GroupSearch::new("http://localhost:2002/api/v1/search", "").unwrap();
        assert_eq!(
            search.url_for("it-dep").as_str(),
            "http://localhost:2002/api/v1/search/it-dep"
        );
        assert_eq!(
            search.url_for("a/b?c").as_str(),
            "http://localhost:2002/api/v1/search/a%2Fb%3Fc"
        );

        let trailing = GroupSearch::new("http://localhost:2002/api/v1/search/", "").unwrap();
        assert_eq!(
            trailing.url_for("x").as_str(),
            "http://localhost:2002/api/v1/search/x"
        );
    }

    #[test]
    fn invalid_base_is_a_config_error() {
        assert!(matches!(GroupSearch::new("not a url", ""), Err(Error::Config(_))));
        assert!(matches!(GroupSearch::new("mailto:x@cern.ch", ""), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn relays_status_body_and_content_type() {
        let base = spawn_groupd().await;
        let search = GroupSearch::new(&base, "groupd-secret").unwrap();

        let response = search.query("it-dep").await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"[{"filter":"it-dep"}]"#);
    }

    #[tokio::test]
    async fn upstream_error_status_is_relayed() {
        let base = spawn_groupd().await;
        let search = GroupSearch::new(&base, "wrong").unwrap();

        let response = search.query("it-dep").await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_500() {
        let search = GroupSearch::new("http://127.0.0.1:1/api/v1/search", "").unwrap();
        let err = search.query("it-dep").await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
