use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Process-wide shutdown flag shared by every worker.
///
/// Sleeps poll the flag at one-second granularity and use the monotonic
/// clock, so system suspend or wall-clock adjustments never extend a wait.
#[derive(Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on shutdown.
    /// Returns `false` when the sleep was interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let step = (deadline - now).min(Duration::from_secs(1));
            tokio::time::sleep(step).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_interrupted() {
        let shutdown = Shutdown::new();
        assert!(shutdown.sleep(Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_breaks_on_shutdown() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.sleep(Duration::from_secs(3600)).await });
        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown.request();
        assert!(!handle.await.unwrap());
    }

    #[test]
    fn flag_is_shared_across_clones() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        clone.request();
        assert!(shutdown.is_requested());
    }
}
