// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kyc_orchestrator::{api, config::Config, state::AppState, watcher::EventWatcher};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(config);
    info!(chain_mode = state.chain.mode(), "chain gateway initialized");

    let shutdown = CancellationToken::new();
    let watcher = EventWatcher::new(state.chain.clone(), state.audit.clone());
    let watcher_handle = tokio::spawn(watcher.run(shutdown.clone()));

    let app = api::router(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(%addr, "KYC orchestrator listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("Server failed");

    shutdown.cancel();
    let _ = watcher_handle.await;
    info!("shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolve on SIGINT or SIGTERM, cancelling background tasks first.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    token.cancel();
}
