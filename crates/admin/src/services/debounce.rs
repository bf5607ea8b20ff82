//! Trailing-edge debounce for remote field checks.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Result of a debounced call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    /// This call was the latest; its work ran.
    Ready(T),
    /// A newer call arrived; this one did nothing, or its result is stale.
    Superseded,
}

impl<T> Debounced<T> {
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Superseded => None,
        }
    }

    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Runs only the last call made within `delay`.
///
/// Clones share the same window, so one input field should own one debouncer
/// and clone it into each keystroke's task.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the window, then run `work` unless a newer call arrived.
    ///
    /// A result that lands after a newer call started is also `Superseded`.
    pub async fn run<F, Fut, T>(&self, work: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if !self.is_current(ticket) {
            return Debounced::Superseded;
        }

        let value = work().await;
        if self.is_current(ticket) {
            Debounced::Ready(value)
        } else {
            Debounced::Superseded
        }
    }

    /// Invalidate every pending call without starting a new one.
    ///
    /// Callers that reject input locally use this so an older value still
    /// waiting out its window resolves to `Superseded`.
    pub fn supersede(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_call_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let runs = Arc::new(AtomicUsize::new(0));

        let first = {
            let debouncer = debouncer.clone();
            let runs = runs.clone();
            tokio::spawn(async move {
                debouncer
                    .run(|| async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        "first"
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = {
            let debouncer = debouncer.clone();
            let runs = runs.clone();
            tokio::spawn(async move {
                debouncer
                    .run(|| async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        "second"
                    })
                    .await
            })
        };

        assert_eq!(first.await.unwrap(), Debounced::Superseded);
        assert_eq!(second.await.unwrap(), Debounced::Ready("second"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_outside_window_both_run() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        assert_eq!(debouncer.run(|| async { 1 }).await, Debounced::Ready(1));
        assert_eq!(debouncer.run(|| async { 2 }).await, Debounced::Ready(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_the_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        debouncer.run(|| async {}).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_is_superseded() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let slow = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move {
                debouncer
                    .run(|| async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        "slow"
                    })
                    .await
            })
        };
        // Let the slow call pass its window and start working.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let fresh = debouncer.run(|| async { "fresh" }).await;

        assert_eq!(fresh, Debounced::Ready("fresh"));
        assert_eq!(slow.await.unwrap(), Debounced::Superseded);
        assert!(Debounced::<()>::Superseded.ready().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_cancels_pending_call() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let runs = Arc::new(AtomicUsize::new(0));

        let pending = {
            let debouncer = debouncer.clone();
            let runs = runs.clone();
            tokio::spawn(async move {
                debouncer
                    .run(|| async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.supersede();

        assert_eq!(pending.await.unwrap(), Debounced::Superseded);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
