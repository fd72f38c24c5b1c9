// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use dstack_attestation_facade::{
    api::router,
    config::Config,
    liveness::{DelayedExit, LivenessTracker},
    logging::init_tracing,
    state::AppState,
    tappd::{TappdClient, TappdEndpoint},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_tracing(config.log_format);
    config.warn_discarded();

    // One client for the whole process; requests share it by reference.
    let endpoint =
        TappdEndpoint::parse(&config.tappd_endpoint).expect("Failed to parse tappd endpoint");
    let backend = TappdClient::new(endpoint).expect("Failed to create tappd client");
    info!(endpoint = %backend.endpoint(), "Using tappd backend");

    let liveness = Arc::new(LivenessTracker::new(
        config.failure_threshold,
        Arc::new(DelayedExit::default()),
    ));

    if config.expose_env {
        warn!("EXPOSE_ENV is enabled: /env serves the full process environment");
    }

    let state = AppState::new(Arc::new(backend), liveness)
        .with_expose_env(config.expose_env)
        .with_api_docs(config.api_docs);
    let app = router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .expect("Failed to bind listen address");
    let addr = listener
        .local_addr()
        .expect("Failed to read listen address");

    info!(
        %addr,
        failure_threshold = config.failure_threshold,
        "dstack attestation facade listening"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .expect("HTTP server failed");

    info!("dstack attestation facade stopped");
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
