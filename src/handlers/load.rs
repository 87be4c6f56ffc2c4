use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Number of concurrent Tokio tasks generating load
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the load runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Mean simulated operation time (μs)
    #[serde(default = "default_mean_delay")]
    pub mean_delay_us: u64,
}

fn default_concurrency() -> u32 {
    10
}
fn default_duration() -> u64 {
    30
}
fn default_mean_delay() -> u64 {
    500
}

impl LoadConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.concurrency == 0 || self.concurrency > 500 {
            return Err(AppError::BadRequest(
                "concurrency must be between 1 and 500".into(),
            ));
        }
        if self.duration_secs == 0 || self.duration_secs > 300 {
            return Err(AppError::BadRequest(
                "duration_secs must be between 1 and 300".into(),
            ));
        }
        if self.mean_delay_us == 0 || self.mean_delay_us > 1_000_000 {
            return Err(AppError::BadRequest(
                "mean_delay_us must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoadStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/load/start ────────────────────────────────────────

pub async fn start_load(
    State(state): State<Arc<AppState>>,
    Json(config): Json<LoadConfig>,
) -> Result<Json<LoadStatus>, AppError> {
    config.validate()?;

    // Claim the flag atomically so two concurrent starts cannot both win
    if state
        .load_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(AppError::AlreadyRunning);
    }

    let msg = format!(
        "Started: {} workers × {}s, ~{}μs per operation",
        config.concurrency, config.duration_secs, config.mean_delay_us,
    );
    tracing::info!(
        concurrency = config.concurrency,
        duration_secs = config.duration_secs,
        mean_delay_us = config.mean_delay_us,
        "load generator started"
    );

    let handle = tokio::spawn(crate::load_generator::run(
        state.load_running.clone(),
        state.meter.clone(),
        config.concurrency,
        config.duration_secs,
        config.mean_delay_us,
    ));

    // Stash the handle so `stop` can await clean shutdown
    *state.load_handle.lock().await = Some(handle);

    Ok(Json(LoadStatus {
        running: true,
        message: msg,
    }))
}

// ─── POST /api/load/stop ─────────────────────────────────────────

pub async fn stop_load(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let was_running = state.load_running.swap(false, Ordering::SeqCst);

    // Await the generator so we know every worker has exited
    if let Some(handle) = state.load_handle.lock().await.take() {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "load generator ended abnormally");
        }
    }

    Json(LoadStatus {
        running: false,
        message: if was_running {
            "Load generator stopped".into()
        } else {
            "No load generator is running".into()
        },
    })
}

// ─── GET /api/load/status ────────────────────────────────────────

pub async fn load_status(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let running = state.load_running.load(Ordering::SeqCst);
    Json(LoadStatus {
        running,
        message: if running {
            "Load in progress".into()
        } else {
            "Idle".into()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(concurrency: u32, duration_secs: u64, mean_delay_us: u64) -> LoadConfig {
        LoadConfig {
            concurrency,
            duration_secs,
            mean_delay_us,
        }
    }

    #[test]
    fn empty_body_uses_defaults() {
        let config: LoadConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.duration_secs, 30);
        assert_eq!(config.mean_delay_us, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(config(0, 10, 100).validate().is_err());
        assert!(config(501, 10, 100).validate().is_err());
        assert!(config(1, 0, 100).validate().is_err());
        assert!(config(1, 301, 100).validate().is_err());
        assert!(config(1, 10, 0).validate().is_err());
        assert!(config(500, 300, 1_000_000).validate().is_ok());
    }
}
