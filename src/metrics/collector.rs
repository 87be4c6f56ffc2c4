use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::percentiles::{quantile, PercentileSet};
use super::rate::Rate;
use super::reservoir::{SnapshottingReservoir, UniformReservoir, DEFAULT_CAPACITY};
use super::{Metric, Read, Snapshot};
use crate::error::{MetricsError, Result};
use crate::units::TimeUnit;

// ─── Configuration ───────────────────────────────────────────────

/// Settings for a [`LatencyMeter`]. Every field has a default, so a
/// partial JSON object deserializes into a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Quantiles reported per window, each in `[0, 1]`
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,

    /// Unit the call rate is expressed per (e.g. calls per "seconds")
    #[serde(default = "default_rate_unit")]
    pub rate_unit: String,

    /// Unit latency quantiles are expressed in
    #[serde(default = "default_latency_unit")]
    pub latency_unit: String,

    /// Reservoir capacity per window
    #[serde(default = "default_reservoir_size")]
    pub reservoir_size: usize,
}

fn default_quantiles() -> Vec<f64> {
    vec![0.5, 0.75, 0.95, 0.98, 0.99, 0.999]
}
fn default_rate_unit() -> String {
    TimeUnit::Seconds.as_str().into()
}
fn default_latency_unit() -> String {
    TimeUnit::Milliseconds.as_str().into()
}
fn default_reservoir_size() -> usize {
    DEFAULT_CAPACITY
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            quantiles: default_quantiles(),
            rate_unit: default_rate_unit(),
            latency_unit: default_latency_unit(),
            reservoir_size: default_reservoir_size(),
        }
    }
}

impl MeterConfig {
    pub fn quantiles(mut self, quantiles: impl Into<Vec<f64>>) -> Self {
        self.quantiles = quantiles.into();
        self
    }

    pub fn rate_unit(mut self, unit: impl Into<String>) -> Self {
        self.rate_unit = unit.into();
        self
    }

    pub fn latency_unit(mut self, unit: impl Into<String>) -> Self {
        self.latency_unit = unit.into();
        self
    }

    pub fn reservoir_size(mut self, size: usize) -> Self {
        self.reservoir_size = size;
        self
    }
}

// ─── Public types ────────────────────────────────────────────────

/// Call rate plus latency distribution over read-and-reset windows.
///
/// Each `update` is one call whose value is its latency in nanoseconds:
/// the value goes into the reservoir and the rate counts the call.
/// The rate and the reservoir are each snapshotted atomically, but not
/// jointly, so a call racing a snapshot may show up in one window's rate
/// and the next window's latencies.
pub struct LatencyMeter {
    rate: Rate,
    reservoir: SnapshottingReservoir,
    quantiles: Vec<f64>,
    rate_unit: TimeUnit,
    latency_unit: TimeUnit,
}

/// One quantile of a window's latency sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileValue {
    pub quantile: f64,
    /// `None` when the window saw no calls
    pub value: Option<f64>,
}

/// Everything a single window measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub time: DateTime<Utc>,
    /// Calls per `rate_unit`
    pub rate: f64,
    pub rate_unit: TimeUnit,
    pub latency_unit: TimeUnit,
    pub latencies: Vec<QuantileValue>,
    /// Number of latencies the quantiles were drawn from
    pub sampled: usize,
    /// Unscaled sample summary, in nanoseconds
    pub summary: PercentileSet,
}

impl WindowReport {
    /// Value reported for quantile `q`, if `q` was configured.
    pub fn latency(&self, q: f64) -> Option<f64> {
        self.latencies
            .iter()
            .find(|entry| entry.quantile == q)
            .and_then(|entry| entry.value)
    }
}

// ─── LatencyMeter impl ───────────────────────────────────────────

impl LatencyMeter {
    pub fn new(config: MeterConfig) -> Result<Self> {
        let rate_unit: TimeUnit = config.rate_unit.parse()?;
        let latency_unit: TimeUnit = config.latency_unit.parse()?;
        if let Some(&bad) = config.quantiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(MetricsError::QuantileOutOfRange(bad));
        }
        let reservoir = UniformReservoir::snapshotting(config.reservoir_size)?;

        tracing::debug!(
            rate_unit = %rate_unit,
            latency_unit = %latency_unit,
            reservoir_size = config.reservoir_size,
            quantiles = ?config.quantiles,
            "latency meter created"
        );

        Ok(Self {
            rate: Rate::new(),
            reservoir,
            quantiles: config.quantiles,
            rate_unit,
            latency_unit,
        })
    }

    /// Record one call from its measured duration.
    pub fn record(&self, elapsed: Duration) {
        self.update(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX));
    }

    fn report(&self, rate_per_ns: f64, sorted: &[i64]) -> WindowReport {
        let latencies = self
            .quantiles
            .iter()
            .map(|&q| QuantileValue {
                quantile: q,
                // quantiles were range-checked in `new`
                value: quantile(sorted, q)
                    .ok()
                    .flatten()
                    .map(|ns| self.latency_unit.scale_duration(ns as f64)),
            })
            .collect();

        WindowReport {
            time: Utc::now(),
            rate: self.rate_unit.scale_rate(rate_per_ns),
            rate_unit: self.rate_unit,
            latency_unit: self.latency_unit,
            latencies,
            sampled: sorted.len(),
            summary: PercentileSet::from_sorted(sorted),
        }
    }
}

impl Metric for LatencyMeter {
    fn update(&self, value: i64) {
        self.reservoir.update(value);
        self.rate.update(1);
    }
}

impl Read for LatencyMeter {
    type Output = WindowReport;

    fn read(&self) -> WindowReport {
        let rate = self.rate.read();
        let sorted = self.reservoir.read();
        self.report(rate, &sorted)
    }
}

impl Snapshot for LatencyMeter {
    type Output = WindowReport;

    fn snapshot(&self) -> WindowReport {
        let rate = self.rate.snapshot();
        let sorted = self.reservoir.snapshot();
        self.report(rate, &sorted)
    }
}
