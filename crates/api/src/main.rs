use std::net::SocketAddr;
use std::sync::Arc;

use folio_worker::config::EngineConfig;
use folio_worker::engine::JobManager;
use folio_worker::logs::{FileLogStore, TaskLogStore};
use folio_worker::sandbox::ProcessSandbox;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "folio_api=debug,folio_worker=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let engine_config = EngineConfig::from_env();
    tracing::info!(
        solver = %engine_config.solver_path.display(),
        log_dir = %engine_config.log_dir.display(),
        timeout_secs = engine_config.solver_timeout.as_secs(),
        "Loaded engine configuration",
    );
    if !engine_config.solver_path.is_file() {
        tracing::warn!(
            solver = %engine_config.solver_path.display(),
            "Solver binary not found; optimizations will fail until it is installed",
        );
    }

    // --- Job engine ---
    let logs: Arc<dyn TaskLogStore> = Arc::new(FileLogStore::new(&engine_config.log_dir));
    let sandbox = ProcessSandbox::from_config(&engine_config, Arc::clone(&logs));
    let jobs = JobManager::new(Arc::new(sandbox), logs);

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // An in-flight solve is not recovered; its child dies with the runtime.
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
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
        _ = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
