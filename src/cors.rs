// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # CORS
//!
//! Origin enforcement is called from inside each cross-origin handler
//! rather than as an outer layer: the handler's response carries the
//! `Access-Control-Allow-Origin` header only once the check has passed.
//!
//! Preflight (`OPTIONS`) only admits the `Authorization` request header and
//! the methods the route actually serves.

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS,
            ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use url::Url;

use crate::error::ApiError;
use crate::origin::OriginPolicy;

/// An origin that passed the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigin(String);

impl AllowedOrigin {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Set `Access-Control-Allow-Origin` on a response.
    pub fn wrap(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            response
                .headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        response
    }
}

/// Check the request's `Origin` header against the policy.
pub fn enforce_origin(policy: &OriginPolicy, headers: &HeaderMap) -> Result<AllowedOrigin, ApiError> {
    let raw = headers
        .get(ORIGIN)
        .ok_or_else(|| ApiError::bad_request("missing Origin header"))?
        .to_str()
        .map_err(|_| ApiError::bad_request("Origin header is not valid UTF-8"))?;

    let url = Url::parse(raw).map_err(|e| ApiError::bad_request(format!("invalid Origin: {e}")))?;

    policy
        .check(&url)
        .map(AllowedOrigin)
        .ok_or_else(|| ApiError::bad_request(format!("origin not allowed: {raw}")))
}

/// Answer a CORS preflight for a route serving `allowed`.
pub fn preflight(policy: &OriginPolicy, headers: &HeaderMap, allowed: &[Method]) -> Response {
    let origin = match enforce_origin(policy, headers) {
        Ok(origin) => origin,
        Err(e) => return e.into_response(),
    };

    match check_preflight(headers, allowed) {
        Ok(()) => {
            let methods = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(",");
            let mut response = StatusCode::OK.into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&methods) {
                headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
            }
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Authorization"),
            );
            origin.wrap(response)
        }
        Err(e) => origin.wrap(e),
    }
}

fn check_preflight(headers: &HeaderMap, allowed: &[Method]) -> Result<(), ApiError> {
    let requested_headers = headers
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !requested_headers.eq_ignore_ascii_case("authorization") {
        return Err(ApiError::bad_request(format!(
            "preflight requests headers {requested_headers:?}"
        )));
    }

    let requested_method = headers
        .get(ACCESS_CONTROL_REQUEST_METHOD)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_uppercase();
    if !allowed.iter().any(|m| m.as_str() == requested_method) {
        return Err(ApiError::bad_request(format!(
            "preflight requests method {requested_method:?}"
        )));
    }

    Ok(())
}
