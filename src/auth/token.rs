// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session tokens handed to the SWAN client.
//!
//! HS256 compact JWS with exactly two claims:
//!
//! - `username`: the authenticated subject
//! - `exp`: expiry in **nanoseconds** since the epoch
//!
//! The nanosecond `exp` is what the deployed client and earlier gateway
//! versions exchange, so third-party JWT validators will not interpret it
//! correctly. The library's seconds-based expiry check is switched off and
//! expiry is compared here in the same unit it was written in.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Token lifetime (1 hour).
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Claims of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub exp: i64,
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies session tokens with the configured signing key.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(sign_key: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(sign_key.as_bytes()),
            decoding: DecodingKey::from_secret(sign_key.as_bytes()),
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Issue a token for `subject`, valid for one hour from now.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl;
        let exp = expires_at
            .timestamp_nanos_opt()
            .ok_or_else(|| AuthError::InternalError("expiry out of range".to_string()))?;

        let claims = SessionClaims {
            username: subject.to_string(),
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return its `username`.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)?.claims;

        let now = now
            .timestamp_nanos_opt()
            .ok_or_else(|| AuthError::InternalError("clock out of range".to_string()))?;
        if claims.exp <= now {
            return Err(AuthError::TokenExpired);
        }
        if claims.username.is_empty() {
            return Err(AuthError::MissingSubject);
        }

        Ok(claims.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const KEY: &str = "changeme";

    fn service() -> TokenService {
        TokenService::new(KEY)
    }

    fn forge(claims_json: &str, key: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(claims_json).unwrap();
        encode(
            &Header::new(Algorithm::HS256),
            &value,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let issued = service().issue("alice").unwrap();
        assert_eq!(service().verify(&issued.token).unwrap(), "alice");
    }

    #[test]
    fn exp_claim_is_in_nanoseconds() {
        let now = Utc::now();
        let issued = service().issue_at("alice", now).unwrap();

        let payload = issued.token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        let expected = (now + Duration::seconds(TOKEN_TTL_SECS))
            .timestamp_nanos_opt()
            .unwrap();
        assert_eq!(claims["exp"].as_i64().unwrap(), expected);
        assert_eq!(claims["username"], "alice");
        assert_eq!(claims.as_object().unwrap().len(), 2);
        assert_eq!(issued.expires_at, now + Duration::seconds(TOKEN_TTL_SECS));
    }

    #[test]
    fn header_is_hs256_without_kid() {
        let issued = service().issue("alice").unwrap();
        let header = jsonwebtoken::decode_header(&issued.token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert!(header.kid.is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued_at = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 1);
        let issued = service().issue_at("alice", issued_at).unwrap();
        assert!(matches!(
            service().verify(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn token_expiring_exactly_now_is_rejected() {
        let now = Utc::now();
        let issued = service().issue_at("alice", now).unwrap();
        let at_expiry = now + Duration::seconds(TOKEN_TTL_SECS);
        assert!(service().verify_at(&issued.token, at_expiry).is_err());
        assert!(service()
            .verify_at(&issued.token, at_expiry - Duration::nanoseconds(1))
            .is_ok());
    }

    #[test]
    fn every_single_bit_flip_is_rejected() {
        let token = service().issue("alice").unwrap().token;
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[i] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                assert!(
                    service().verify(&tampered).is_err(),
                    "bit {bit} of byte {i} accepted"
                );
            }
        }
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = TokenService::new("another-key").issue("alice").unwrap().token;
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn missing_or_mistyped_username_is_rejected() {
        let far_future = i64::MAX;
        let no_username = forge(&format!(r#"{{"exp":{far_future}}}"#), KEY);
        assert!(service().verify(&no_username).is_err());

        let numeric = forge(&format!(r#"{{"username":42,"exp":{far_future}}}"#), KEY);
        assert!(service().verify(&numeric).is_err());

        let empty = forge(&format!(r#"{{"username":"","exp":{far_future}}}"#), KEY);
        assert!(matches!(
            service().verify(&empty),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn seconds_based_exp_counts_as_expired() {
        // A standard RFC 7519 expiry one hour ahead, read as nanoseconds,
        // lies in 1970.
        let exp_secs = Utc::now().timestamp() + 3600;
        let token = forge(&format!(r#"{{"username":"alice","exp":{exp_secs}}}"#), KEY);
        assert!(matches!(service().verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            service().verify("not-a-token"),
            Err(AuthError::MalformedToken)
        ));
    }
}
