// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! cboxswanapid - SWAN sharing API gateway
//!
//! Authenticating HTTP front for the CERNBox project-sharing utility. The
//! SWAN notebook client trades an SSO identity (or an OIDC ID token) for a
//! short-lived session token, then lists, updates, deletes and clones
//! project shares and searches users and e-groups with it.
//!
//! ## Modules
//!
//! - `api` - route table and HTTP handlers (Axum)
//! - `auth` - session tokens, OIDC verification and admission middleware
//! - `cors` - per-request origin checks and preflight answers
//! - `subprocess` - share utility invocation
//! - `config` / `cli` - layered configuration
//! - `telemetry` - application and access logs

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod cors;
pub mod error;
pub mod models;
pub mod origin;
pub mod state;
pub mod subprocess;
pub mod telemetry;

#[cfg(test)]
mod test_support;
