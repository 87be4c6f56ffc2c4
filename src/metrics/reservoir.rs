use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::snapshot::Snapshotting;
use super::{Metric, Read, Snapshot};
use crate::error::{MetricsError, Result};
use crate::random::next_index;

/// Reservoir size used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1028;

/// Fixed-size uniform sample of an unbounded stream.
///
/// The first `capacity` values fill the slots in order. After that the
/// `s`-th value replaces a random slot with probability `capacity / s`, so
/// every value seen so far is retained with equal probability. Updates are
/// O(1) and lock-free.
///
/// Two racing updates may write the same slot; one of them wins. The
/// admitted count is never lost.
#[derive(Debug)]
pub struct UniformReservoir {
    admitted: AtomicU64,
    slots: Box<[AtomicI64]>,
}

impl UniformReservoir {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MetricsError::InvalidCapacity(capacity));
        }
        Ok(Self::with_valid_capacity(capacity))
    }

    /// Builds a reservoir whose windows reset on every snapshot.
    pub fn snapshotting(capacity: usize) -> Result<SnapshottingReservoir> {
        if capacity == 0 {
            return Err(MetricsError::InvalidCapacity(capacity));
        }
        let factory: Box<dyn Fn() -> Self + Send + Sync> =
            Box::new(move || Self::with_valid_capacity(capacity));
        Ok(Snapshotting::new(factory))
    }

    fn with_valid_capacity(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| AtomicI64::new(0)).collect();
        Self {
            admitted: AtomicU64::new(0),
            slots,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of `update` calls since creation.
    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Acquire)
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.admitted().min(self.slots.len() as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.admitted() == 0
    }

    /// Sorted copy of the populated slots.
    pub fn values(&self) -> Vec<i64> {
        let mut values: Vec<i64> = self.slots[..self.len()]
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect();
        values.sort_unstable();
        values
    }
}

impl Default for UniformReservoir {
    fn default() -> Self {
        Self::with_valid_capacity(DEFAULT_CAPACITY)
    }
}

impl Metric for UniformReservoir {
    fn update(&self, value: i64) {
        let seq = self.admitted.fetch_add(1, Ordering::AcqRel) + 1;
        let capacity = self.slots.len() as u64;

        let slot = if seq <= capacity {
            seq - 1
        } else {
            let r = next_index(seq);
            if r >= capacity {
                return;
            }
            r
        };
        self.slots[slot as usize].store(value, Ordering::Relaxed);
    }
}

impl Read for UniformReservoir {
    type Output = Vec<i64>;

    fn read(&self) -> Vec<i64> {
        self.values()
    }
}

/// A reservoir that starts over after every snapshot.
pub type SnapshottingReservoir =
    Snapshotting<UniformReservoir, Box<dyn Fn() -> UniformReservoir + Send + Sync>>;

/// Snapshot of a reservoir that was never wrapped: returns the sorted
/// values and keeps accruing.
impl Snapshot for UniformReservoir {
    type Output = Vec<i64>;

    fn snapshot(&self) -> Vec<i64> {
        self.values()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::metrics::quantile;

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(UniformReservoir::new(0).unwrap_err(), MetricsError::InvalidCapacity(0));
        assert!(UniformReservoir::snapshotting(0).is_err());
    }

    #[test]
    fn default_capacity() {
        assert_eq!(UniformReservoir::default().capacity(), 1028);
    }

    #[test]
    fn empty_reservoir_reads_nothing() {
        let reservoir = UniformReservoir::new(8).unwrap();
        assert!(reservoir.is_empty());
        assert!(reservoir.read().is_empty());
    }

    #[test]
    fn keeps_everything_until_full() {
        let reservoir = UniformReservoir::new(100).unwrap();
        let inserted: Vec<i64> = (0..100).map(|i| (i * 7919) % 101 - 50).collect();
        for &v in &inserted {
            reservoir.update(v);
        }
        let mut expected = inserted.clone();
        expected.sort_unstable();
        assert_eq!(reservoir.read(), expected);
    }

    #[test]
    fn partial_fill_is_sorted() {
        let reservoir = UniformReservoir::new(10).unwrap();
        for v in [5, -3, 9, 0] {
            reservoir.update(v);
        }
        assert_eq!(reservoir.len(), 4);
        assert_eq!(reservoir.read(), vec![-3, 0, 5, 9]);
    }

    #[test]
    fn size_is_capped_once_full() {
        let reservoir = UniformReservoir::new(16).unwrap();
        for n in 1..=1_000 {
            reservoir.update(n);
            assert_eq!(reservoir.read().len(), (n as usize).min(16));
        }
        assert_eq!(reservoir.admitted(), 1_000);
    }

    #[test]
    fn retained_values_come_from_the_stream() {
        let reservoir = UniformReservoir::new(32).unwrap();
        for v in 1_000..2_000 {
            reservoir.update(v);
        }
        assert!(reservoir.read().iter().all(|v| (1_000..2_000).contains(v)));
    }

    #[test]
    fn median_tracks_the_stream() {
        const N: i64 = 100_000;
        const K: usize = 1028;
        let reservoir = UniformReservoir::new(K).unwrap();
        for v in 0..N {
            reservoir.update(v);
        }
        let values = reservoir.read();
        let median = quantile(&values, 0.5).unwrap().unwrap();
        // a uniform sample of 1028 values puts the median within a few
        // percent of N/2; allow K * 10 to keep the test stable
        assert!((median - N / 2).abs() < K as i64 * 10, "median {median}");
    }

    #[test]
    fn late_values_are_admitted_with_falling_probability() {
        // the 2nd value into a capacity-1 reservoir survives about half the time
        let mut survived = 0;
        for _ in 0..4_000 {
            let reservoir = UniformReservoir::new(1).unwrap();
            reservoir.update(0);
            reservoir.update(1);
            survived += reservoir.read()[0];
        }
        assert!((1_600..2_400).contains(&survived), "{survived}");
    }

    #[test]
    fn snapshotting_reservoir_isolates_windows() {
        let reservoir = UniformReservoir::snapshotting(DEFAULT_CAPACITY).unwrap();
        reservoir.update(1);
        reservoir.update(-10);
        reservoir.update(23);
        assert_eq!(reservoir.snapshot(), vec![-10, 1, 23]);
        assert!(reservoir.snapshot().is_empty());
    }

    #[test]
    fn plain_reservoir_keeps_accruing_across_snapshots() {
        let reservoir = UniformReservoir::new(4).unwrap();
        reservoir.update(2);
        assert_eq!(reservoir.snapshot(), vec![2]);
        reservoir.update(1);
        assert_eq!(reservoir.snapshot(), vec![1, 2]);
    }

    #[test]
    fn snapshot_keeps_capacity() {
        let reservoir = UniformReservoir::snapshotting(3).unwrap();
        for v in 0..10 {
            reservoir.update(v);
        }
        assert_eq!(reservoir.snapshot().len(), 3);
        assert_eq!(reservoir.with_live(|r| r.capacity()), 3);
    }

    #[test]
    fn concurrent_updates_fill_exactly_capacity() {
        let reservoir = Arc::new(UniformReservoir::new(64).unwrap());
        let producers: Vec<_> = (0..8)
            .map(|t| {
                let reservoir = reservoir.clone();
                thread::spawn(move || {
                    for i in 0..10_000 {
                        reservoir.update(t * 10_000 + i);
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(reservoir.admitted(), 80_000);
        let values = reservoir.read();
        assert_eq!(values.len(), 64);
        assert!(values.iter().all(|v| (0..80_000).contains(v)));
    }
}
