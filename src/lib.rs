//! Read-and-reset metric primitives.
//!
//! Many producer threads call [`Metric::update`]; one periodic reader calls
//! [`Snapshot::snapshot`], which returns everything observed since the
//! previous snapshot and starts a new, empty window. Producers never block.
//!
//! - [`Rate`]: running sum over elapsed time.
//! - [`UniformReservoir`]: fixed-size uniform sample for quantiles.
//! - [`Snapshotting`]: makes any readable metric read-and-reset.
//! - [`LatencyMeter`]: call rate plus latency quantiles per window.
//! - [`Reporter`]: drives snapshots on a tokio interval.

pub mod error;
pub mod metrics;
pub mod random;
pub mod reporter;
pub mod units;

pub use error::{MetricsError, Result};
pub use metrics::{
    quantile, LatencyMeter, MeterConfig, Metric, PercentileSet, QuantileValue, Rate, Read,
    RateWindow, Snapshot, Snapshotting, SnapshottingReservoir, UniformReservoir, WindowReport,
    DEFAULT_CAPACITY,
};
pub use reporter::Reporter;
pub use units::TimeUnit;
