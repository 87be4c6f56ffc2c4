use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use window_metrics::LatencyMeter;

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `concurrency` Tokio tasks that simulate work and record each
/// operation's latency until the deadline or the `running` flag is
/// cleared.
pub async fn run(
    running: Arc<AtomicBool>,
    meter: Arc<LatencyMeter>,
    concurrency: u32,
    duration_secs: u64,
    mean_delay_us: u64,
) {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(concurrency as usize);

    for worker_id in 0..concurrency {
        let running = running.clone();
        let meter = meter.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, meter, deadline, mean_delay_us).await;
        }));
    }

    for h in handles {
        if let Err(e) = h.await {
            // a dead worker must not take the meter or its siblings down
            tracing::error!(error = %e, "load worker ended abnormally");
        }
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("load generator finished");
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u32,
    running: Arc<AtomicBool>,
    meter: Arc<LatencyMeter>,
    deadline: Instant,
    mean_delay_us: u64,
) {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let delay = simulated_delay(&mut rng, mean_delay_us);

        let t0 = Instant::now();
        tokio::time::sleep(delay).await;
        meter.record(t0.elapsed());
    }
}

/// Mostly uniform around the mean, with a 1% slow tail at 10x.
fn simulated_delay(rng: &mut StdRng, mean_delay_us: u64) -> Duration {
    let base = rng.gen_range(0..=mean_delay_us.saturating_mul(2));
    let us = if rng.gen_bool(0.01) {
        base.saturating_mul(10)
    } else {
        base
    };
    Duration::from_micros(us)
}

#[cfg(test)]
mod tests {
    use super::*;
    use window_metrics::{MeterConfig, Snapshot};

    #[test]
    fn delays_stay_within_tail_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert!(simulated_delay(&mut rng, 100) <= Duration::from_micros(2_000));
        }
    }

    #[tokio::test]
    async fn records_until_stopped() {
        let meter = Arc::new(LatencyMeter::new(MeterConfig::default()).unwrap());
        let running = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run(running.clone(), meter.clone(), 4, 60, 200));
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.store(false, Ordering::SeqCst);
        task.await.unwrap();

        let report = meter.snapshot();
        assert!(report.sampled > 0);
        assert!(report.rate > 0.0);
    }
}
