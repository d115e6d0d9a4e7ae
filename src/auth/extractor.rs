// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! The token middleware verifies the bearer token and stores the
//! [`AuthenticatedUser`] in the request extensions; `Auth` hands it to the
//! handler:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.username is the verified subject
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedUser};

/// Extractor for authenticated users.
///
/// Rejects with 401 when the route was not guarded by the token middleware
/// or the stored username is empty.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)?;

        if user.username.is_empty() {
            return Err(AuthError::MissingSubject);
        }

        Ok(Auth(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn reads_user_from_extensions() {
        let mut parts = parts();
        parts.extensions.insert(AuthenticatedUser::new("alice"));

        let Auth(user) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn ignores_authorization_header_without_middleware() {
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer whatever")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn rejects_empty_username() {
        let mut parts = parts();
        parts.extensions.insert(AuthenticatedUser::new(""));

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingSubject)));
    }
}
