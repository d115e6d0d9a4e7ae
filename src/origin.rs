// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Origin Policy
//!
//! Decides whether a caller URL may talk to the API cross-origin and builds
//! the single origin string both sides agree on for `postMessage` targeting,
//! `Access-Control-Allow-Origin` and `X-Frame-Options: ALLOW-FROM`.
//!
//! The origin string is rebuilt from the parsed URL, never echoed from the
//! raw header.

use regex::{Regex, RegexBuilder};
use url::Url;

use crate::error::{Error, Result};

/// Allow-from policy compiled from the `allowfrom` setting.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    pattern: Regex,
}

impl OriginPolicy {
    /// Compile the allow-from pattern.
    ///
    /// The pattern is unanchored and matched ignoring ASCII case.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("invalid allowfrom pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Check a caller URL.
    ///
    /// Returns the canonical origin when the scheme is `https` and the
    /// authority matches the pattern, `None` otherwise.
    pub fn check(&self, url: &Url) -> Option<String> {
        if url.scheme() != "https" {
            tracing::info!(scheme = url.scheme(), "only https origins are accepted");
            return None;
        }

        let authority = authority(url)?;
        let matched = self.pattern.is_match(&authority);
        tracing::debug!(
            host = %authority,
            pattern = self.pattern.as_str(),
            matched,
            "checking allowed host"
        );

        matched.then(|| canonical_origin(url))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// `<scheme>://<host>[:<port>]` of a URL, without path or trailing slash.
///
/// Default ports are omitted.
pub fn canonical_origin(url: &Url) -> String {
    match authority(url) {
        Some(authority) => format!("{}://{}", url.scheme(), authority),
        None => format!("{}://", url.scheme()),
    }
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::new("swan[a-z0-9-]*.cern.ch").unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn accepts_matching_https_host() {
        assert_eq!(
            policy().check(&url("https://swan01.cern.ch/")),
            Some("https://swan01.cern.ch".to_string())
        );
    }

    #[test]
    fn rejects_non_https_schemes() {
        let policy = policy();
        for origin in [
            "http://swan01.cern.ch/",
            "ftp://swan01.cern.ch/",
            "wss://swan01.cern.ch/",
        ] {
            assert_eq!(policy.check(&url(origin)), None, "{origin}");
        }
    }

    #[test]
    fn rejects_non_matching_host() {
        assert_eq!(policy().check(&url("https://evil.example.org/")), None);
    }

    #[test]
    fn match_ignores_case_on_both_sides() {
        let upper = OriginPolicy::new("SWAN[A-Z0-9-]*.CERN.CH").unwrap();
        assert_eq!(
            upper.check(&url("https://swan-qa.cern.ch")),
            Some("https://swan-qa.cern.ch".to_string())
        );
        assert!(policy().check(&url("https://SWAN01.CERN.CH/")).is_some());
    }

    #[test]
    fn pattern_is_unanchored() {
        assert!(policy()
            .check(&url("https://notswan01.cern.ch.example.org"))
            .is_some());
    }

    #[test]
    fn canonical_origin_drops_path_and_keeps_port() {
        assert_eq!(
            canonical_origin(&url("https://swan01.cern.ch/user/alice/tree?x=1")),
            "https://swan01.cern.ch"
        );
        assert_eq!(
            canonical_origin(&url("https://swan01.cern.ch:8443/")),
            "https://swan01.cern.ch:8443"
        );
        assert_eq!(
            canonical_origin(&url("https://swan01.cern.ch:443/")),
            "https://swan01.cern.ch"
        );
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(matches!(OriginPolicy::new("swan("), Err(Error::Config(_))));
    }
}
