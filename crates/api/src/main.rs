use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use corae_core::ffmpeg::FfprobeProbe;
use corae_core::storage::LocalBlobStore;
use corae_db::store::{EntityStore, MemoryStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use corae_api::config::{ServerConfig, StoreBackend};
use corae_api::router::build_app_router;
use corae_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "corae_api=debug,corae_lifecycle=debug,tower_http=debug".into()
            }),
        )
        .with(fmt_layer)
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store: Arc<dyn EntityStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = corae_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            corae_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            corae_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Uploads ---
    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.uploads_dir.display()))?;
    tracing::info!(uploads_dir = %config.uploads_dir.display(), "Upload storage ready");

    let state = AppState {
        store,
        blobs: Arc::new(LocalBlobStore::new(config.uploads_dir.clone())),
        probe: Arc::new(FfprobeProbe::new(config.probe_timeout)),
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config).map_err(anyhow::Error::msg)?;

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    let shutdown_grace = Duration::from_secs(config.shutdown_timeout_secs);
    let (signal_tx, signal_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    });

    let mut graceful_rx = signal_rx.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = graceful_rx.wait_for(|fired| *fired).await;
        })
        .into_future();

    // In-flight requests get `shutdown_grace` to finish once the signal fires.
    let mut deadline_rx = signal_rx;
    tokio::select! {
        result = server => result.context("Server error")?,
        _ = async {
            let _ = deadline_rx.wait_for(|fired| *fired).await;
            tokio::time::sleep(shutdown_grace).await;
        } => {
            tracing::warn!(
                timeout_secs = shutdown_grace.as_secs(),
                "Graceful shutdown timed out, dropping remaining connections",
            );
        }
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
