//! Web backend server
//!
//! Serves the JSON cache API behind per-route rate limits, plus a
//! rate-limited WebSocket echo.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webapp_backend::{
    create_router, spawn_cleanup_task, AdmissionConfig, AdmissionSettings, AppState, Config,
};

/// Main entry point for the backend server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing (stdout, plus a daily log file when `LOG_DIR` is set)
/// 3. Create both stores and initialize the admission config
/// 4. Start background expiry sweeps
/// 5. Create Axum router with all endpoints
/// 6. Serve with peer addresses until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    let _log_guard = init_tracing(config.log_dir.as_deref());

    info!("Starting webapp backend");
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, policy={:?}, port={}, cleanup_interval={}s",
        config.max_entries,
        config.default_ttl,
        config.cache_policy,
        config.server_port,
        config.cleanup_interval
    );

    let state = AppState::from_config(&config).context("Failed to create cache stores")?;
    state
        .admission
        .init(AdmissionSettings::new(config.rate_limit_prefix.clone()));

    let interval = Duration::from_secs(config.cleanup_interval.max(1));
    let sweeps = vec![
        spawn_cleanup_task(state.cache.clone(), interval, "cache"),
        spawn_cleanup_task(state.limits.clone(), interval, "rate_limits"),
    ];
    info!("Background expiry sweeps started");

    let admission = state.admission.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(admission, sweeps))
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Stdout logging, plus a non-blocking daily rolling file under `log_dir`.
///
/// The returned guard flushes the file writer on drop and must live until
/// the process exits.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "webapp-backend.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webapp_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, closes the admission config so no further checks pass, then
/// aborts the sweep tasks.
async fn shutdown_signal(admission: std::sync::Arc<AdmissionConfig>, sweeps: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    admission.close();
    for sweep in sweeps {
        sweep.abort();
    }
    warn!("Admission config closed and expiry sweeps aborted");
}
