// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use oauth_claims_api::{
    api::router, claims::ClaimsCache, config::ApiConfig, logging::init_tracing, state::AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;
    init_tracing(&config.logging);

    let state = AppState::from_config(&config)?;
    let shutdown = CancellationToken::new();

    let sweeper = tokio::spawn(purge_expired_claims(
        state.claims_cache().clone(),
        config.cache.purge_interval,
        shutdown.clone(),
    ));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(
        address = %address,
        api_name = %config.api_name,
        "OAuth claims API listening"
    );

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
            server_shutdown.cancel();
        })
        .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Claims cache sweeper failed");
    }
    served?;

    info!("OAuth claims API stopped");
    Ok(())
}

/// Remove expired claims on an interval until shutdown.
async fn purge_expired_claims(
    cache: Arc<ClaimsCache>,
    interval: std::time::Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Claims cache sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Purged expired claims");
                }
            }
        }
    }
}
