// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::state::AppState;

/// Bind a listener on an ephemeral loopback port; returns it with its base URL.
pub async fn bind_local() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Serve `app` on `listener` in the background for the rest of the test.
pub fn spawn_server(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

/// Write an executable shell script standing in for the share utility.
pub fn mock_utility(dir: &Path, script: &str) -> String {
    let path = dir.join("cernbox-swan-project");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Configuration used by router-level tests.
pub fn test_config() -> Config {
    Config {
        secret: "test-secret".to_string(),
        signkey: "test-signing-key".to_string(),
        oidcprovider: String::new(),
        cboxsharescript: "/nonexistent/cernbox-swan-project".to_string(),
        cboxshareconfig: "/etc/cernbox/share.php".to_string(),
        ..Config::default()
    }
}

/// State without OIDC and with a share utility that cannot be launched.
pub fn test_state() -> AppState {
    AppState::new(test_config()).unwrap()
}
