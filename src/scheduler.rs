//! Periodic synchronization.
//!
//! [`spawn_periodic_sync`] runs one sync immediately and then one per
//! interval on a background task. Failures are logged and the schedule
//! continues. Ticks that fall due while a sync is still running are skipped
//! rather than queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::SyncCache;
use crate::traits::PageSource;

/// Handle to a running periodic sync. Dropping it detaches the task, which
/// then runs for the life of the runtime; call [`SyncScheduler::shutdown`]
/// to stop it.
pub struct SyncScheduler {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncScheduler {
    /// Stop the schedule and wait for the task to exit.
    ///
    /// A sync already in progress is allowed to finish first.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            error!("sync scheduler task failed: {}", e);
        }
    }
}

pub fn spawn_periodic_sync<S>(cache: Arc<SyncCache<S>>, interval: Duration) -> SyncScheduler
where
    S: PageSource + 'static,
{
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(every_secs = interval.as_secs(), "periodic sync scheduled");

        // Cleared once the handle is dropped: nobody can stop the task then.
        let mut attached = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stopped.changed(), if attached => {
                    if changed.is_ok() {
                        break;
                    }
                    debug!("sync scheduler handle dropped, detaching");
                    attached = false;
                    continue;
                }
            }

            match cache.synchronize().await {
                Ok(count) => info!(pages = count, "scheduled sync finished"),
                Err(e) => error!("scheduled sync failed: {}", e),
            }

            if *stopped.borrow() {
                break;
            }
        }

        info!("periodic sync stopped");
    });

    SyncScheduler { stop, task }
}
