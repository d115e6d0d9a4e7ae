// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// SWAN sharing API gateway
#[derive(Parser, Debug)]
#[command(name = "cboxswanapid")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CBOXSWANAPID_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Application log sink (stderr, stdout or a file path)
    #[arg(long)]
    pub applog: Option<String>,

    /// Access log sink (stderr, stdout or a file path)
    #[arg(long)]
    pub httplog: Option<String>,

    /// Shared secret for `bearer <secret>` admission
    #[arg(long)]
    pub secret: Option<String>,

    /// HMAC key for session tokens
    #[arg(long)]
    pub signkey: Option<String>,

    /// OIDC client id of the SWAN service
    #[arg(long)]
    pub swanclient: Option<String>,

    /// OIDC issuer URL (empty disables /swanapi/v2/authenticate)
    #[arg(long)]
    pub oidcprovider: Option<String>,

    /// Regular expression for allowed origin hosts
    #[arg(long)]
    pub allowfrom: Option<String>,

    /// Origin of the SSO login page
    #[arg(long)]
    pub shibreferer: Option<String>,

    /// Bearer secret for the group search daemon
    #[arg(long)]
    pub cboxgroupdsecret: Option<String>,

    /// Group search endpoint
    #[arg(long)]
    pub cboxgroupdurl: Option<String>,

    /// Share utility executable
    #[arg(long)]
    pub cboxsharescript: Option<String>,

    /// Share utility configuration file
    #[arg(long)]
    pub cboxshareconfig: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Per-request deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum concurrent share utility processes
    #[arg(long)]
    pub maxprocs: Option<usize>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Print the OpenAPI document as JSON
    Openapi,
}

impl Cli {
    /// Apply the flags that were given on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        fn set<T: Clone>(slot: &mut T, flag: &Option<T>) {
            if let Some(value) = flag {
                *slot = value.clone();
            }
        }

        set(&mut config.port, &self.port);
        set(&mut config.applog, &self.applog);
        set(&mut config.httplog, &self.httplog);
        set(&mut config.secret, &self.secret);
        set(&mut config.signkey, &self.signkey);
        set(&mut config.swanclient, &self.swanclient);
        set(&mut config.oidcprovider, &self.oidcprovider);
        set(&mut config.allowfrom, &self.allowfrom);
        set(&mut config.shibreferer, &self.shibreferer);
        set(&mut config.cboxgroupdsecret, &self.cboxgroupdsecret);
        set(&mut config.cboxgroupdurl, &self.cboxgroupdurl);
        set(&mut config.cboxsharescript, &self.cboxsharescript);
        set(&mut config.cboxshareconfig, &self.cboxshareconfig);
        set(&mut config.log_level, &self.log_level);
        set(&mut config.timeout, &self.timeout);
        set(&mut config.maxprocs, &self.maxprocs);
    }

    pub fn mode(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["cboxswanapid"]).unwrap();
        assert_eq!(cli.mode(), Command::Serve);
    }

    #[test]
    fn openapi_subcommand() {
        let cli = Cli::try_parse_from(["cboxswanapid", "openapi"]).unwrap();
        assert_eq!(cli.mode(), Command::Openapi);
    }

    #[test]
    fn flags_override_only_when_given() {
        let cli = Cli::try_parse_from([
            "cboxswanapid",
            "--port",
            "9000",
            "--allowfrom",
            "swan-qa[0-9]+.cern.ch",
            "--log-level",
            "debug",
            "--maxprocs",
            "8",
        ])
        .unwrap();

        let mut config = Config::default();
        config.secret = "from-file".to_string();
        cli.apply(&mut config);

        assert_eq!(config.port, 9000);
        assert_eq!(config.allowfrom, "swan-qa[0-9]+.cern.ch");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.maxprocs, 8);
        assert_eq!(config.secret, "from-file");
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Cli::try_parse_from(["cboxswanapid", "--port", "http"]).is_err());
    }
}
