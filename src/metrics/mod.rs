pub mod collector;
pub mod percentiles;
pub mod rate;
pub mod reservoir;
pub mod snapshot;

use std::sync::Arc;

pub use collector::{LatencyMeter, MeterConfig, QuantileValue, WindowReport};
pub use percentiles::{quantile, PercentileSet};
pub use rate::{Rate, RateWindow};
pub use reservoir::{SnapshottingReservoir, UniformReservoir, DEFAULT_CAPACITY};
pub use snapshot::Snapshotting;

/// The write side: producers push observations in, from any thread.
pub trait Metric: Send + Sync {
    fn update(&self, value: i64);
}

/// Non-destructive observation of the current window.
pub trait Read {
    type Output;

    fn read(&self) -> Self::Output;
}

/// The reader side: returns everything observed since the previous
/// snapshot and starts a fresh, empty window.
pub trait Snapshot {
    type Output;

    fn snapshot(&self) -> Self::Output;
}

impl<M: Metric + ?Sized> Metric for Arc<M> {
    #[inline]
    fn update(&self, value: i64) {
        (**self).update(value)
    }
}

impl<R: Read + ?Sized> Read for Arc<R> {
    type Output = R::Output;

    fn read(&self) -> Self::Output {
        (**self).read()
    }
}

impl<S: Snapshot + ?Sized> Snapshot for Arc<S> {
    type Output = S::Output;

    fn snapshot(&self) -> Self::Output {
        (**self).snapshot()
    }
}
