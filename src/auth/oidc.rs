// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OIDC ID-token verification for `/swanapi/v2/authenticate`.
//!
//! The provider is resolved once at startup from its discovery document.
//! ID tokens must be signed by a key in the provider's JWKS, issued by the
//! configured issuer, addressed to the SWAN client id and not expired.

use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;

use super::jwks::JwksManager;
use super::AuthError;
use crate::error::{Error, Result};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// The part of the discovery document we rely on.
#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    issuer: String,
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    sub: String,
}

/// Verifier bound to one provider and one client id.
#[derive(Clone)]
pub struct OidcVerifier {
    issuer: String,
    client_id: String,
    jwks: JwksManager,
}

impl OidcVerifier {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>, jwks: JwksManager) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            jwks,
        }
    }

    /// Resolve the provider at `issuer` via `/.well-known/openid-configuration`.
    pub async fn discover(client: reqwest::Client, issuer: &str, client_id: &str) -> Result<Self> {
        let url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );

        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Discovery(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }
        let metadata: ProviderMetadata = response.json().await?;

        if metadata.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
            return Err(Error::Discovery(format!(
                "issuer mismatch: configured {issuer}, provider reports {}",
                metadata.issuer
            )));
        }

        tracing::info!(issuer = %metadata.issuer, jwks_uri = %metadata.jwks_uri, "OIDC provider resolved");

        let jwks = JwksManager::new(client, metadata.jwks_uri);
        Ok(Self::new(metadata.issuer, client_id, jwks))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify an ID token and return its subject.
    pub async fn verify(&self, id_token: &str) -> std::result::Result<String, AuthError> {
        let header = decode_header(id_token).map_err(|_| AuthError::MalformedToken)?;

        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => self.jwks.get_decoding_key(kid).await?,
            None => self.jwks.get_any_decoding_key().await?,
        };

        if header.alg != algorithm {
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let claims = decode::<IdTokenClaims>(id_token, &decoding_key, &validation)?.claims;

        if claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(claims.sub)
    }
}
