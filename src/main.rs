// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::Handle;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use swanapid::{
    api,
    auth::OidcVerifier,
    cli::{Cli, Command},
    config::Config,
    error::Result,
    state::AppState,
    telemetry::{init_tracing, LogSink},
};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.mode() {
        Command::Openapi => match api::openapi_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to render OpenAPI document: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Serve => match serve(&cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "cboxswanapid stopped");
                eprintln!("cboxswanapid: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn serve(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let access = LogSink::open(&config.httplog)?;
    init_tracing(LogSink::open(&config.applog)?, &config.log_level)?;
    tracing::info!(config = ?config, "configuration loaded");

    let oidc = if config.oidc_enabled() {
        let verifier =
            OidcVerifier::discover(reqwest::Client::new(), &config.oidcprovider, &config.swanclient)
                .await?;
        tracing::info!(issuer = verifier.issuer(), "OIDC authentication enabled");
        Some(verifier)
    } else {
        tracing::info!("oidcprovider is empty, /swanapi/v2/authenticate is disabled");
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let mut state = AppState::new(config)?;
    if let Some(verifier) = oidc {
        state = state.with_oidc(verifier);
    }
    let app = api::router(state, access);

    let handle = Handle::<SocketAddr>::new();
    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    tracing::info!(%addr, "cboxswanapid listening");
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    tracing::info!("cboxswanapid shut down");
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
