// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens for the SWAN sharing API.
//!
//! ## Auth Flow
//!
//! 1. The SSO proxy authenticates the user and injects `adfs_login`, or the
//!    client presents an OIDC ID token (`/swanapi/v2/authenticate`)
//! 2. The gateway issues an HS256 session token valid for one hour
//! 3. The client sends `Authorization: Bearer <token>` on every share call
//! 4. `require_token` verifies it and stores the subject in the request
//!    extensions, where the `Auth` extractor picks it up
//!
//! ## Security
//!
//! - Handlers never take the username from headers or query parameters
//! - Every token failure answers 401 with an empty body
//! - Token `exp` is in nanoseconds since the epoch (client wire format)

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod oidc;
pub mod token;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
pub use oidc::OidcVerifier;
pub use token::{IssuedToken, TokenService};
