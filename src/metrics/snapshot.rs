use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{Metric, Read, Snapshot};

/// Turns any [`Metric`] with a [`Read`] view into a read-and-reset metric.
///
/// Holds exactly one live instance in an atomically swappable cell.
/// `update` forwards to whatever instance is live; `snapshot` swaps in a
/// fresh instance from the factory in a single exchange and reads the
/// detached one. Producers never take a lock.
///
/// An update that loaded the old instance just before the swap lands in
/// the old instance after it was detached. It is never lost or counted
/// twice, but it may miss the value returned by that snapshot's read.
pub struct Snapshotting<M, F = fn() -> M> {
    live: ArcSwap<M>,
    factory: F,
}

impl<M, F> Snapshotting<M, F>
where
    F: Fn() -> M,
{
    pub fn new(factory: F) -> Self {
        let live = ArcSwap::from_pointee(factory());
        Self { live, factory }
    }

    /// Detaches the live instance and installs a fresh one, returning the
    /// detached instance itself rather than its read value.
    pub fn take(&self) -> Arc<M> {
        self.live.swap(Arc::new((self.factory)()))
    }

    /// Runs `f` against the live instance without detaching it.
    pub fn with_live<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.live.load())
    }
}

impl<M, F> Metric for Snapshotting<M, F>
where
    M: Metric,
    F: Fn() -> M + Send + Sync,
{
    #[inline]
    fn update(&self, value: i64) {
        self.live.load().update(value);
    }
}

impl<M, F> Read for Snapshotting<M, F>
where
    M: Read,
    F: Fn() -> M,
{
    type Output = M::Output;

    fn read(&self) -> Self::Output {
        self.live.load().read()
    }
}

impl<M, F> Snapshot for Snapshotting<M, F>
where
    M: Read,
    F: Fn() -> M,
{
    type Output = M::Output;

    fn snapshot(&self) -> Self::Output {
        self.take().read()
    }
}

impl<M: fmt::Debug, F> fmt::Debug for Snapshotting<M, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshotting")
            .field("live", &**self.live.load())
            .finish_non_exhaustive()
    }
}
