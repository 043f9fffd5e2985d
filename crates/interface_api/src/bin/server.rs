//! Film Warranty Core - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin warranty-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin warranty-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` / `API_DB_MIN_CONNECTIONS` - Pool size
//! * `API_DB_ACQUIRE_TIMEOUT_SECS` / `API_DB_IDLE_TIMEOUT_SECS` / `API_DB_MAX_LIFETIME_SECS` - Pool timeouts
//! * `API_JWT_ACCESS_SECRET` / `API_JWT_REFRESH_SECRET` - Token signing secrets
//! * `API_UPLOAD_DIR` / `API_UPLOAD_BASE_URL` - Where uploads go and how they are served
//! * `API_CLAIM_APPROVAL_MODE` - `tri_state` or `boolean`
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, DatabaseConfig, PgGateway};
use interface_api::config::ApiConfig;
use interface_api::storage::LocalDiskStorage;
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("loading configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        claim_approval_mode = %config.claim_approval_mode,
        "Starting film warranty API server"
    );
    if config.uses_default_jwt_secrets() {
        tracing::warn!(
            "JWT secrets are the shipped placeholders; set API_JWT_ACCESS_SECRET and API_JWT_REFRESH_SECRET"
        );
    }

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections)
            .acquire_timeout(config.db_acquire_timeout())
            .idle_timeout(config.db_idle_timeout())
            .max_lifetime(config.db_max_lifetime()),
    )
    .await
    .context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let storage = Arc::new(LocalDiskStorage::new(
        config.upload_dir.clone(),
        config.upload_base_url.clone(),
    ));
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("parsing bind address")?;

    let app = create_router(AppState::new(PgGateway::new(pool), storage, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
