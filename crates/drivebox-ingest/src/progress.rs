//! Debounced progress reporting.
//!
//! Non-forced updates cancel any pending report and reschedule it after
//! the quiet period; forced updates cancel pending work and fire inline.
//! The pipeline forces the start, terminal, and failure reports, so the
//! subscriber always observes the `(0, total)` and `(total, total)`
//! events even under heavy debouncing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Progress callback: `(loaded_bytes, total_bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Debouncing wrapper around a progress callback.
#[derive(Clone)]
pub struct ProgressReporter {
    /// The subscriber callback.
    callback: ProgressFn,
    /// Quiet period for non-forced updates.
    delay: Duration,
    /// The currently scheduled report, if any.
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("delay", &self.delay)
            .finish()
    }
}

impl ProgressReporter {
    /// Create a reporter with the given quiet period.
    pub fn new(callback: ProgressFn, delay: Duration) -> Self {
        Self {
            callback,
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Report progress. A non-forced call reschedules the pending report;
    /// a forced call bypasses the debounce and flushes immediately.
    pub async fn update(&self, loaded: u64, total: u64, force: bool) {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        if force || self.delay.is_zero() {
            (self.callback)(loaded, total);
            return;
        }

        let callback = self.callback.clone();
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(loaded, total);
        }));
    }

    /// Forced immediate report.
    pub async fn flush(&self, loaded: u64, total: u64) {
        self.update(loaded, total, true).await;
    }
}
