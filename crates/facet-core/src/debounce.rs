//! Trailing-edge debounce for free-text searches.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tracing::trace;

/// Runs a job once input has been quiet for a fixed delay.
///
/// Scheduling a job cancels the one still waiting, so a burst of keystrokes
/// triggers a single search. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    /// Quiet period.
    delay: Duration,
    /// The job waiting to fire, if any.
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Creates a debouncer from a delay in milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Schedules `job`, replacing any job still waiting.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        }));
    }

    /// Drops the waiting job, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            trace!("cancelling debounced job");
            handle.abort();
        }
    }

    /// True while a scheduled job has not finished.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn counter_job(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::from_millis(500);
        for _ in 0..5 {
            debouncer.schedule(counter_job(&counter));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_waiting_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::from_millis(200);
        debouncer.schedule(counter_job(&counter));
        assert!(debouncer.is_pending());
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
