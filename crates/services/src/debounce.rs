use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Coalesces bursts of calls: only a call followed by a full quiet period
/// goes through.
#[derive(Clone, Debug)]
pub struct SearchDebouncer {
    quiet: Duration,
    generation: Arc<AtomicU64>,
}

impl SearchDebouncer {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Wait out the quiet period. Returns `false` if another call arrived
    /// meanwhile.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.quiet).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_call_in_burst_settles() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(400));

        let first = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };

        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_both_settle() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(300));
        assert!(debouncer.settle().await);
        assert!(debouncer.settle().await);
    }
}
