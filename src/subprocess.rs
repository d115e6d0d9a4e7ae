// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Subprocess Gateway
//!
//! Runs the CERNBox share utility and turns its outcome into an HTTP
//! response. The utility is the source of truth for the response body: its
//! stdout is always returned verbatim, success or not.
//!
//! ## Invocation
//!
//! `<program> -c <config> --json <action> <args...>`, spawned directly
//! (no shell). The child is killed when the request future is dropped, so a
//! client disconnect or the request deadline never leaves it running.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Error envelope the utility prints on stdout when it fails.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CmdError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub statuscode: u16,
}

impl CmdError {
    /// Parse the envelope out of a failed invocation's stdout.
    pub fn parse(stdout: &[u8]) -> Option<Self> {
        serde_json::from_slice(stdout).ok()
    }

    /// The status to answer with, if the envelope carries a usable one.
    pub fn status(&self) -> Option<StatusCode> {
        if !(200..=599).contains(&self.statuscode) {
            return None;
        }
        StatusCode::from_u16(self.statuscode).ok()
    }
}

/// Why an invocation did not succeed.
#[derive(Debug, Error)]
pub enum Failure {
    /// The process could not be started.
    #[error("failed to launch: {0}")]
    Launch(std::io::Error),
    /// The process ran and exited unsuccessfully.
    #[error("{0}")]
    Exit(ExitStatus),
}

/// One call of the utility.
#[derive(Debug)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub failure: Option<Failure>,
}

impl Invocation {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Status code for the client.
    ///
    /// 200 on success; on failure the envelope's status when stdout holds a
    /// valid one, 500 otherwise.
    pub fn status(&self) -> StatusCode {
        if self.succeeded() {
            return StatusCode::OK;
        }
        CmdError::parse(&self.stdout)
            .and_then(|envelope| envelope.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Invocation {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Body::from(self.stdout)).into_response()
    }
}

/// Handle on the share utility.
#[derive(Debug, Clone)]
pub struct ShareUtility {
    program: String,
    config_path: String,
    permits: Arc<Semaphore>,
}

impl ShareUtility {
    /// `max_concurrent` bounds how many utility processes run at once.
    pub fn new(
        program: impl Into<String>,
        config_path: impl Into<String>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            program: program.into(),
            config_path: config_path.into(),
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Full argument vector for an action.
    pub fn argv<I, S>(&self, action: &str, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![
            "-c".to_string(),
            self.config_path.clone(),
            "--json".to_string(),
            action.to_string(),
        ];
        argv.extend(args.into_iter().map(Into::into));
        argv
    }

    /// Run `action` with positional `args` and capture both streams.
    pub async fn run<I, S>(&self, action: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = self.argv(action, args);
        tracing::info!(program = %self.program, args = ?argv, "running share utility");

        // The semaphore is never closed.
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return Invocation {
                    argv,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                    failure: Some(Failure::Launch(std::io::Error::other(e))),
                }
            }
        };

        let output = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let invocation = match output {
            Ok(output) => Invocation {
                argv,
                failure: (!output.status.success()).then_some(Failure::Exit(output.status)),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e) => Invocation {
                argv,
                stdout: Vec::new(),
                stderr: Vec::new(),
                failure: Some(Failure::Launch(e)),
            },
        };

        if let Some(failure) = &invocation.failure {
            tracing::error!(
                program = %self.program,
                args = ?invocation.argv,
                error = %failure,
                stderr = %String::from_utf8_lossy(&invocation.stderr),
                "share utility failed"
            );
        }

        invocation
    }
}
