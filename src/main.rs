// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use stats_authorizer::{
    api::router, auth::AuthorizerService, config::Config, state::AppState, telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // The subscriber needs the config; report on stderr directly.
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(config.log_format);

    let authorizer = match AuthorizerService::from_config(&config.auth) {
        Ok(authorizer) => authorizer,
        Err(e) => {
            tracing::error!(error = %e, "failed to build authorizer");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        issuer = %config.auth.issuer,
        jwks_url = %config.auth.jwks_url,
        cookie = %config.auth.cookie_name,
        algorithm = ?config.auth.algorithm,
        "authorizer configured"
    );

    let app = router(AppState::new(authorizer));

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(addr = %config.addr, "stats authorizer listening (docs at /docs)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
