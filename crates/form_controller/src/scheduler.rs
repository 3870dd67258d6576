//! Deferred success callbacks.

use std::{fmt, sync::Arc, time::Duration};

use tokio::{task::AbortHandle, time::Instant};
use tracing::debug;

pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle to one scheduled callback.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    abort: AbortHandle,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Runs callbacks once after a fixed delay. Callbacks that have not fired
/// when the scheduler is dropped are cancelled.
pub struct SuccessScheduler {
    delay: Duration,
    pending: Vec<ScheduledTask>,
}

impl fmt::Debug for SuccessScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuccessScheduler")
            .field("delay", &self.delay)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl SuccessScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Vec::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, callback: Callback) -> ScheduledTask {
        self.pending.retain(|task| !task.is_finished());
        let deadline = Instant::now() + self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            callback();
        });
        let task = ScheduledTask {
            abort: handle.abort_handle(),
        };
        self.pending.push(task.clone());
        debug!(delay_ms = self.delay.as_millis() as u64, "success callback scheduled");
        task
    }

    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|task| !task.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        let cancelled = self.pending.len();
        for task in self.pending.drain(..) {
            task.cancel();
        }
        if cancelled > 0 {
            debug!(cancelled, "pending success callbacks cancelled");
        }
    }
}

impl Drop for SuccessScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
