mod airtable;
mod app;
mod config;
mod error;
mod routes;
mod services;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    if config.airtable.token.is_none() {
        tracing::warn!("AIRTABLE_TOKEN is not set; proxy endpoints will return config errors");
    } else if config.airtable.base_id.is_none() {
        tracing::warn!("AIRTABLE_BASE_ID is not set; map endpoints will return config errors");
    }
    tracing::info!(
        static_dir = %config.static_dir.display(),
        cache_ttl_secs = config.upstream_cache_ttl_secs,
        "configuration loaded"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config);

    // Spawn background services
    tokio::spawn(services::cache_evictor::run(state.clone()));

    let app = app::build_app(state);

    tracing::info!("Atlas map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
