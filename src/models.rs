// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response shapes of the wire API. Listing responses are not
//! modelled here: they are the share utility's stdout, passed through
//! verbatim.
//!
//! ## Model Categories
//!
//! - **Authentication**: the token handed to the browser window
//! - **Sharing**: the sharee list of `PUT /swanapi/v1/share`
//! - **Queries**: query strings of the share endpoints

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::http::Uri;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

// =============================================================================
// Authentication
// =============================================================================

/// Token posted to the parent window by the authenticate bridge page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TokenResponse {
    /// Session token (HS256 JWS).
    pub authtoken: String,
    /// Expiry, RFC 3339 in UTC.
    pub expire: String,
}

impl TokenResponse {
    pub fn new(authtoken: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            authtoken,
            expire: expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Query of the authenticate endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuthenticateQuery {
    /// URL of the browser window that receives the token.
    #[serde(rename = "Origin")]
    pub origin: Option<String>,
}

// =============================================================================
// Sharing
// =============================================================================

static SHAREE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._@-]+$").expect("sharee name pattern is valid")
});

/// Kind of sharee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// A single user account.
    U,
    /// An e-group.
    Egroup,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Entity::U => "u",
            Entity::Egroup => "egroup",
        }
    }
}

/// One recipient of a share.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Sharee {
    pub name: String,
    pub entity: Entity,
}

impl Sharee {
    /// Argument handed to the share utility: `<entity>:<name>`.
    pub fn argument(&self) -> Result<String, ApiError> {
        if !SHAREE_NAME.is_match(&self.name) {
            return Err(ApiError::bad_request(format!(
                "invalid sharee name {:?}",
                self.name
            )));
        }
        Ok(format!("{}:{}", self.entity.as_str(), self.name))
    }
}

/// Body of `PUT /swanapi/v1/share`: the complete new sharee set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShareRequest {
    pub share_with: Vec<Sharee>,
}

impl ShareRequest {
    /// Parse and validate a request body.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("invalid share body: {e}")))?;
        if request.share_with.is_empty() {
            return Err(ApiError::bad_request("share_with is empty"));
        }
        Ok(request)
    }

    /// Utility arguments for every sharee, in request order.
    pub fn arguments(&self) -> Result<Vec<String>, ApiError> {
        self.share_with.iter().map(Sharee::argument).collect()
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Query naming one of the caller's projects.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProjectQuery {
    /// Project name.
    pub project: Option<String>,
}

/// Query of `POST /swanapi/v1/clone`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CloneQuery {
    /// Owner of the shared project.
    pub sharer: Option<String>,
    /// Shared project name.
    pub project: Option<String>,
    /// Name of the copy in the caller's space.
    pub destination: Option<String>,
}

/// Query string parameters. A repeated name keeps its first value.
#[derive(Debug, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn from_uri(uri: &Uri) -> Self {
        let mut params = HashMap::new();
        if let Some(query) = uri.query() {
            for (name, value) in form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(name.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

impl AuthenticateQuery {
    pub fn from_uri(uri: &Uri) -> Self {
        Self {
            origin: QueryParams::from_uri(uri).get("Origin"),
        }
    }
}

impl ProjectQuery {
    pub fn from_uri(uri: &Uri) -> Self {
        Self {
            project: QueryParams::from_uri(uri).get("project"),
        }
    }
}

impl CloneQuery {
    pub fn from_uri(uri: &Uri) -> Self {
        let params = QueryParams::from_uri(uri);
        Self {
            sharer: params.get("sharer"),
            project: params.get("project"),
            destination: params.get("destination"),
        }
    }
}

/// A required, non-empty query parameter.
pub fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("missing parameter {name}"))),
    }
}

/// A required parameter that becomes a positional argument of the share
/// utility. A leading `-` would be read as an option.
pub fn positional<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    let value = required(value, name)?;
    if value.starts_with('-') {
        return Err(ApiError::bad_request(format!(
            "parameter {name} must not start with '-': {value:?}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_response_wire_shape() {
        let expires = Utc.with_ymd_and_hms(2026, 10, 17, 12, 30, 0).unwrap();
        let response = TokenResponse::new("abc".to_string(), expires);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"authtoken":"abc","expire":"2026-10-17T12:30:00Z"}"#
        );
    }

    #[test]
    fn share_body_yields_entity_prefixed_arguments() {
        let request = ShareRequest::from_body(
            br#"{"share_with":[{"name":"bob","entity":"u"},{"name":"it-dep.swan","entity":"egroup"}]}"#,
        )
        .unwrap();
        assert_eq!(
            request.arguments().unwrap(),
            vec!["u:bob", "egroup:it-dep.swan"]
        );
    }

    #[test]
    fn share_body_rejections() {
        for body in [
            &b""[..],
            b"not json",
            br#"{}"#,
            br#"{"share_with":[]}"#,
            br#"{"share_with":[{"name":"bob","entity":"group"}]}"#,
            br#"{"share_with":[{"name":"bob"}]}"#,
        ] {
            let err = ShareRequest::from_body(body).unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn sharee_names_are_restricted() {
        for name in ["bob; rm -rf /", "$(id)", "a b", "", "bob\n", "a|b"] {
            let sharee = Sharee {
                name: name.to_string(),
                entity: Entity::U,
            };
            assert!(sharee.argument().is_err(), "{name:?} should be rejected");
        }

        let ok = Sharee {
            name: "jane.doe@cern.ch".to_string(),
            entity: Entity::U,
        };
        assert_eq!(ok.argument().unwrap(), "u:jane.doe@cern.ch");
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        assert_eq!(required(&Some("p1".to_string()), "project").unwrap(), "p1");
        assert!(required(&Some(String::new()), "project").is_err());
        assert!(required(&None, "project").is_err());
    }

    #[test]
    fn positional_arguments_cannot_look_like_options() {
        assert_eq!(positional(&Some("p-1".to_string()), "project").unwrap(), "p-1");
        for value in ["--help", "-c/tmp/x", "-", ""] {
            let err = positional(&Some(value.to_string()), "project").unwrap_err();
            assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST, "{value:?}");
        }
    }

    #[test]
    fn repeated_query_parameter_keeps_first_value() {
        let uri: Uri = "/swanapi/v1/share?project=a&project=b".parse().unwrap();
        assert_eq!(ProjectQuery::from_uri(&uri).project.as_deref(), Some("a"));
    }

    #[test]
    fn clone_query_decodes_and_tolerates_absent_query() {
        let uri: Uri = "/swanapi/v1/clone?sharer=bob&project=my%20analysis&destination=copy+1"
            .parse()
            .unwrap();
        let query = CloneQuery::from_uri(&uri);
        assert_eq!(query.sharer.as_deref(), Some("bob"));
        assert_eq!(query.project.as_deref(), Some("my analysis"));
        assert_eq!(query.destination.as_deref(), Some("copy 1"));

        let bare: Uri = "/swanapi/v1/clone".parse().unwrap();
        assert!(CloneQuery::from_uri(&bare).sharer.is_none());
    }

    #[test]
    fn authenticate_query_reads_capitalized_origin() {
        let query: AuthenticateQuery =
            serde_json::from_value(serde_json::json!({ "Origin": "https://swan01.cern.ch/" }))
                .unwrap();
        assert_eq!(query.origin.as_deref(), Some("https://swan01.cern.ch/"));
    }
}
