//! Recurring background tasks with cancellable handles

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a task that runs on a fixed period
///
/// The task stops when [`RecurringTask::cancel`] is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct RecurringTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    /// Spawn `tick` every `period` on the current tokio runtime
    ///
    /// Each tick is awaited before the next one starts, and ticks missed while
    /// a slow tick runs are skipped rather than bunched up.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        info!("Starting recurring task '{}' (interval: {:?})", name, period);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                tick().await;
            }
        });

        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task is still scheduled
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task; a tick in progress is abandoned at its next await point
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!("Cancelling recurring task '{}'", self.name);
            self.handle.abort();
        }
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
