use std::env;
use std::time::Duration;

use thiserror::Error;
use window_metrics::{LatencyMeter, MeterConfig, MetricsError};

// ─── Configuration ───────────────────────────────────────────────

const ADDR_VAR: &str = "WINDOW_METRICS_ADDR";
const INTERVAL_VAR: &str = "WINDOW_METRICS_INTERVAL_MS";
const METER_VAR: &str = "WINDOW_METRICS_METER";

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// Service settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub addr: String,
    /// Length of one reporting window
    pub interval: Duration,
    /// Shared by the load meter and the HTTP meter
    pub meter: MeterConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WINDOW_METRICS_INTERVAL_MS must be a positive integer, got \"{0}\"")]
    Interval(String),

    #[error("WINDOW_METRICS_METER is not valid meter JSON: {0}")]
    MeterJson(#[from] serde_json::Error),

    #[error("invalid meter configuration: {0}")]
    Meter(#[from] MetricsError),
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.into());

        let interval_ms = match lookup(INTERVAL_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => return Err(ConfigError::Interval(raw)),
            },
            None => DEFAULT_INTERVAL_MS,
        };

        let meter = match lookup(METER_VAR) {
            Some(json) => serde_json::from_str(&json)?,
            None => MeterConfig::default(),
        };

        Ok(Self {
            addr,
            interval: Duration::from_millis(interval_ms),
            meter,
        })
    }

    /// Builds a meter from this config; bad units or quantiles fail here.
    pub fn build_meter(&self) -> Result<LatencyMeter, ConfigError> {
        Ok(LatencyMeter::new(self.meter.clone())?)
    }
}
