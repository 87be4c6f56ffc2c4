use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use window_metrics::{LatencyMeter, Reporter, WindowReport};

mod config;
mod handlers;
mod load_generator;
mod middleware;
mod server;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Meter the load generator records simulated operations into.
    pub meter: Arc<LatencyMeter>,

    /// Meter the timing middleware records API requests into.
    pub http_meter: Arc<LatencyMeter>,

    /// Latest closed window of `meter`, published by its reporter.
    pub reports: watch::Receiver<Option<WindowReport>>,

    /// Latest closed window of `http_meter`.
    pub http_reports: watch::Receiver<Option<WindowReport>>,

    /// Flag checked by every load-generator worker on each iteration.
    pub load_running: Arc<AtomicBool>,

    /// Handle to the spawned load-generator task so we can await clean shutdown.
    pub load_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Load configuration ────────────────────────────────────
    let config = match config::ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    // ── 2. Build meters and their reporters ──────────────────────
    let (meter, http_meter) = match (config.build_meter(), config.build_meter()) {
        (Ok(a), Ok(b)) => (Arc::new(a), Arc::new(b)),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "invalid meter configuration");
            std::process::exit(2);
        }
    };

    let reporter = Reporter::spawn(meter.clone(), config.interval);
    let http_reporter = Reporter::spawn(http_meter.clone(), config.interval);

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        meter,
        http_meter,
        reports: reporter.subscribe(),
        http_reports: http_reporter.subscribe(),
        load_running: Arc::new(AtomicBool::new(false)),
        load_handle: tokio::sync::Mutex::new(None),
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state.clone());

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %config.addr,
        interval_ms = config.interval.as_millis() as u64,
        "window observatory listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = served {
        tracing::error!(error = %e, "server exited with error");
    }

    // ── 6. Wind down: stop load first so the last window is complete
    state.load_running.store(false, Ordering::SeqCst);
    if let Some(handle) = state.load_handle.lock().await.take() {
        let _ = handle.await;
    }
    reporter.stop().await;
    http_reporter.stop().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
