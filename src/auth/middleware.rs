// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admission middleware for Axum.
//!
//! Each function either short-circuits with a status code or runs the
//! wrapped handler. They are composed per route with
//! `axum::middleware::from_fn_with_state`:
//!
//! ```rust,ignore
//! let guarded = get(shared).layer(middleware::from_fn_with_state(
//!     state.clone(),
//!     require_token,
//! ));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extract the token from `Authorization: <scheme> <token>`.
///
/// The header must split on single spaces into exactly two parts. The scheme
/// word is not checked.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Require `Authorization: bearer <secret>`, compared ignoring ASCII case.
pub async fn require_shared_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = format!("bearer {}", state.config.secret);
    let matches = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case(&expected));

    if !matches {
        return AuthError::WrongSecret.into_response();
    }
    next.run(request).await
}

/// Require a valid session token and attach its subject to the request.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = bearer_token(request.headers()).and_then(|token| state.tokens.verify(token));

    match verified {
        Ok(username) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::new(username));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Run the wrapped handler unchanged.
///
/// Used on routes authenticated upstream by the SSO proxy.
pub async fn pass_through(request: Request, next: Next) -> Response {
    next.run(request).await
}
