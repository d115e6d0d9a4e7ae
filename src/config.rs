// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are layered, lowest to highest precedence:
//!
//! 1. built-in defaults (development loopback)
//! 2. YAML file: `--config <path>`, else [`DEFAULT_CONFIG_PATH`] if present
//! 3. environment variables prefixed `CBOXSWANAPID_`
//! 4. command-line flags (see `cli`)
//!
//! | Key | Description | Default |
//! |-----|-------------|---------|
//! | `port` | Listen port on `0.0.0.0` | `2005` |
//! | `applog` | Application log sink (`stderr`, `stdout` or a path) | `stderr` |
//! | `httplog` | Access log sink | `stderr` |
//! | `secret` | Shared secret for `bearer <secret>` admission | `changeme` |
//! | `signkey` | HMAC key for session tokens | `changeme` |
//! | `swanclient` | OIDC client id (ID-token audience) | `swan-service` |
//! | `oidcprovider` | OIDC issuer URL, empty disables v2 | CERN SSO realm |
//! | `allowfrom` | Allowed origin host pattern | `swan[a-z0-9-]*.cern.ch` |
//! | `shibreferer` | SSO origin answered with 204 | `https://login.cern.ch` |
//! | `cboxgroupdsecret` | Bearer secret for the group search daemon | empty |
//! | `cboxgroupdurl` | Group search endpoint | `http://localhost:2002/api/v1/search` |
//! | `cboxsharescript` | Share utility executable | see [`Config::default`] |
//! | `cboxshareconfig` | Share utility config file (`-c`) | `/root/kuba-config.php` |
//! | `log-level` | Filter used when `RUST_LOG` is unset | `info` |
//! | `timeout` | Per-request deadline in seconds | `30` |
//! | `maxprocs` | Concurrent share utility processes | `32` |

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::origin::OriginPolicy;

/// YAML file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cboxswanapid/cboxswanapid.yaml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "CBOXSWANAPID_";

/// Process configuration. Loaded once and shared read-only.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub applog: String,
    pub httplog: String,
    pub secret: String,
    pub signkey: String,
    pub swanclient: String,
    pub oidcprovider: String,
    pub allowfrom: String,
    pub shibreferer: String,
    pub cboxgroupdsecret: String,
    pub cboxgroupdurl: String,
    pub cboxsharescript: String,
    pub cboxshareconfig: String,
    #[serde(rename = "log-level", alias = "log_level")]
    pub log_level: String,
    /// Seconds.
    pub timeout: u64,
    pub maxprocs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 2005,
            applog: "stderr".to_string(),
            httplog: "stderr".to_string(),
            secret: "changeme".to_string(),
            signkey: "changeme".to_string(),
            swanclient: "swan-service".to_string(),
            oidcprovider: "https://auth.cern.ch/auth/realms/cern".to_string(),
            allowfrom: "swan[a-z0-9-]*.cern.ch".to_string(),
            shibreferer: "https://login.cern.ch".to_string(),
            cboxgroupdsecret: String::new(),
            cboxgroupdurl: "http://localhost:2002/api/v1/search".to_string(),
            cboxsharescript: "/b/dev/kuba/devel.cernbox_utils/cernbox-swan-project".to_string(),
            cboxshareconfig: "/root/kuba-config.php".to_string(),
            log_level: "info".to_string(),
            timeout: 30,
            maxprocs: 32,
        }
    }
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("applog", &self.applog)
            .field("httplog", &self.httplog)
            .field("secret", &"<redacted>")
            .field("signkey", &"<redacted>")
            .field("swanclient", &self.swanclient)
            .field("oidcprovider", &self.oidcprovider)
            .field("allowfrom", &self.allowfrom)
            .field("shibreferer", &self.shibreferer)
            .field("cboxgroupdsecret", &"<redacted>")
            .field("cboxgroupdurl", &self.cboxgroupdurl)
            .field("cboxsharescript", &self.cboxsharescript)
            .field("cboxshareconfig", &self.cboxshareconfig)
            .field("log_level", &self.log_level)
            .field("timeout", &self.timeout)
            .field("maxprocs", &self.maxprocs)
            .finish()
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file does not exist or any
    /// layer cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                figment = figment.merge(Yaml::file(p));
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    figment = figment.merge(Yaml::file(default));
                }
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::extract(figment)
    }

    /// Extract a configuration from an assembled figment.
    pub fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        OriginPolicy::new(&self.allowfrom)?;

        if self.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.timeout == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        if self.maxprocs == 0 {
            return Err(Error::Config("maxprocs must be at least 1".to_string()));
        }
        if self.signkey.is_empty() {
            return Err(Error::Config("signkey must not be empty".to_string()));
        }
        Url::parse(&self.cboxgroupdurl)
            .map_err(|e| Error::Config(format!("invalid cboxgroupdurl: {e}")))?;
        if !self.oidcprovider.is_empty() {
            Url::parse(&self.oidcprovider)
                .map_err(|e| Error::Config(format!("invalid oidcprovider: {e}")))?;
        }
        Ok(())
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Whether the OIDC authenticate path is enabled.
    pub fn oidc_enabled(&self) -> bool {
        !self.oidcprovider.is_empty()
    }
}
