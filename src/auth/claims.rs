// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified request identity.

use serde::{Deserialize, Serialize};

/// Identity attached to a request once its bearer token has been verified.
///
/// Lives in the request extensions for the duration of one request. Handlers
/// take the username from here and never from headers or query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl AuthenticatedUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_username_only() {
        let user = AuthenticatedUser::new("alice");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            serde_json::json!({ "username": "alice" })
        );
    }
}
