//! Periodic background tasks
//!
//! Owns the processor tick and the catalog refresh tick. Both stop when
//! the scheduler's cancellation token fires.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::TrackCatalog;
use crate::processor::RequestProcessor;

/// Running background tasks
pub struct Scheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the processor (first cycle immediately) and catalog refresh
    /// (first refresh after one period; callers load the catalog up front)
    pub fn start(
        processor: Arc<RequestProcessor>,
        catalog: Arc<TrackCatalog>,
        process_every: Duration,
        refresh_every: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();

        let process_task = spawn_periodic("request-processor", process_every, true, cancel.clone(), move || {
            let processor = processor.clone();
            async move {
                match processor.run_cycle().await {
                    Ok(report) if report.skipped_busy => {}
                    Ok(report) => debug!(?report, "Request cycle report"),
                    Err(e) => warn!(error = %e, "Request cycle aborted, will retry next tick"),
                }
            }
        });

        let refresh_task = spawn_periodic("catalog-refresh", refresh_every, false, cancel.clone(), move || {
            let catalog = catalog.clone();
            async move { catalog.refresh_logged().await }
        });

        info!(
            process_every_secs = process_every.as_secs(),
            refresh_every_secs = refresh_every.as_secs(),
            "Background tasks started"
        );

        Self {
            cancel,
            handles: vec![process_task, refresh_task],
        }
    }

    /// Cancel both tasks and wait for them to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
        info!("Background tasks stopped");
    }
}

/// Run `task` every `period` until cancelled
///
/// Ticks missed while a run is in progress are skipped, not queued.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    immediate: bool,
    cancel: CancellationToken,
    task: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let start = if immediate {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(task = name, "Periodic task cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = task() => {}
                    }
                }
            }
        }
    })
}
