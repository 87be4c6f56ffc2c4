use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use super::{Metric, Read, Snapshot};
use crate::units::TimeUnit;

/// Running sum divided by the time since the last reset.
///
/// Rates are reported in events per nanosecond; scale them with
/// [`TimeUnit::scale_rate`] for display.
///
/// A window of zero length has no defined rate. Instead of dividing by zero
/// it reports `f64::INFINITY` for a positive sum, `f64::NEG_INFINITY` for a
/// negative one and `0.0` for an empty window.
#[derive(Debug)]
pub struct Rate {
    count: AtomicI64,
    /// Nanoseconds since `anchor` at which the current window opened.
    epoch: AtomicU64,
    anchor: Instant,
    // Serializes concurrent snapshots; `update` never touches it.
    reset: Mutex<()>,
}

/// Raw result of closing one rate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateWindow {
    pub count: i64,
    pub elapsed_ns: u64,
}

impl RateWindow {
    pub fn per_nanosecond(&self) -> f64 {
        per_nanosecond(self.count, self.elapsed_ns)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }
}

impl Rate {
    pub fn new() -> Self {
        Self {
            count: AtomicI64::new(0),
            epoch: AtomicU64::new(0),
            anchor: Instant::now(),
            reset: Mutex::new(()),
        }
    }

    /// Sum accumulated in the current window.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Length of the current window so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(self.epoch.load(Ordering::Acquire)))
    }

    /// Current rate scaled to `unit`.
    pub fn read_in(&self, unit: TimeUnit) -> f64 {
        unit.scale_rate(self.read())
    }

    /// Closes the current window and returns its sum and length.
    pub fn snapshot_window(&self) -> RateWindow {
        let (count, elapsed_ns) = {
            let _guard = self.reset.lock();
            let now = self.now();
            let started = self.epoch.swap(now, Ordering::AcqRel);
            let count = self.count.swap(0, Ordering::AcqRel);
            (count, now.saturating_sub(started))
        };

        if elapsed_ns == 0 {
            tracing::warn!(count, "rate window closed with zero elapsed time");
        } else {
            tracing::debug!(count, elapsed_ns, "rate window closed");
        }
        RateWindow { count, elapsed_ns }
    }

    fn now(&self) -> u64 {
        // u64 nanoseconds covers several centuries of uptime
        self.anchor.elapsed().as_nanos() as u64
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for Rate {
    #[inline]
    fn update(&self, value: i64) {
        self.count.fetch_add(value, Ordering::Relaxed);
    }
}

impl Read for Rate {
    type Output = f64;

    fn read(&self) -> f64 {
        let started = self.epoch.load(Ordering::Acquire);
        let count = self.count.load(Ordering::Relaxed);
        per_nanosecond(count, self.now().saturating_sub(started))
    }
}

impl Snapshot for Rate {
    type Output = f64;

    fn snapshot(&self) -> f64 {
        self.snapshot_window().per_nanosecond()
    }
}

fn per_nanosecond(count: i64, elapsed_ns: u64) -> f64 {
    if elapsed_ns > 0 {
        count as f64 / elapsed_ns as f64
    } else if count > 0 {
        f64::INFINITY
    } else if count < 0 {
        f64::NEG_INFINITY
    } else {
        0.0
    }
}
