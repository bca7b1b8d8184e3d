// Main entry point for the company API server

use std::sync::Arc;

use anyhow::{Context, Result};
use company_core::domains::auth::{AdminCredentials, JwtService};
use company_core::kernel::{Publisher, ServerDeps, Store};
use company_core::{server::build_app, Config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,company_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting company API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    tracing::info!("Connecting to database...");
    let store = Store::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    store.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let shutdown = CancellationToken::new();

    tracing::info!("Connecting to NATS...");
    let publisher = Arc::new(
        Publisher::connect(&config.broker, &shutdown)
            .await
            .context("Failed to connect to NATS")?,
    );

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let admin = AdminCredentials::new(config.admin_username.clone(), config.admin_password.clone());
    let app = build_app(ServerDeps::new(
        store.clone(),
        publisher.clone(),
        jwt_service,
        admin,
    ));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Requests have drained; stop the publisher before the pool closes
    shutdown.cancel();
    publisher.disconnect().await;
    store.disconnect().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Received shutdown signal");
}
