use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics::Snapshot;

/// Snapshots a metric on a fixed cadence from a single task and publishes
/// each window's result.
///
/// Subscribers always see the most recent window; a slow subscriber skips
/// windows rather than holding the reporter back.
pub struct Reporter<T> {
    latest: watch::Receiver<Option<T>>,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl<T> Reporter<T>
where
    T: Send + Sync + 'static,
{
    /// Spawns the reporting task on the current tokio runtime. The first
    /// window closes one `period` after this call.
    pub fn spawn<S>(source: Arc<S>, period: Duration) -> Self
    where
        S: Snapshot<Output = T> + Send + Sync + 'static,
    {
        let (tx, latest) = watch::channel(None);
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(period_ms = period.as_millis() as u64, "reporter started");

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = interval.tick() => {
                        tx.send_replace(Some(source.snapshot()));
                    }
                }
            }
            tracing::info!("reporter stopped");
        });

        Self {
            latest,
            stop,
            handle,
        }
    }

    /// A receiver that wakes on every new window.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.latest.clone()
    }

    /// The most recent window, if one has closed yet.
    pub fn latest(&self) -> Option<T>
    where
        T: Clone,
    {
        self.latest.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the task after any in-flight snapshot completes.
    ///
    /// A panic raised by the source while snapshotting is logged here; the
    /// metric itself is left as it was.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "reporter task ended abnormally");
        }
    }
}
