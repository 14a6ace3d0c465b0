//! Per-model sliding-window request gate, shared process-wide.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::warn;

use tucan_core::config::ModelLimits;
use tucan_core::Shutdown;

#[derive(Default)]
struct Window {
    stamps: VecDeque<Instant>,
}

/// One sliding window per model name. The mutex is held only across
/// bookkeeping, never across a sleep.
#[derive(Clone, Default)]
pub struct RateLimiters {
    windows: Arc<DashMap<String, Arc<Mutex<Window>>>>,
}

impl RateLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until a request to `limits.name` fits the window.
    /// Returns `false` when shutdown was requested while waiting.
    pub async fn acquire(&self, limits: &ModelLimits, shutdown: &Shutdown) -> bool {
        let period = Duration::from_secs(limits.request_limit_period_seconds);
        let window = self
            .windows
            .entry(limits.name.clone())
            .or_default()
            .clone();

        loop {
            let wait = {
                let mut window = window.lock().unwrap();
                let now = Instant::now();
                while window
                    .stamps
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= period)
                {
                    window.stamps.pop_front();
                }
                if (window.stamps.len() as u32) < limits.request_limit {
                    window.stamps.push_back(now);
                    return true;
                }
                // Wait until the oldest kept stamp leaves the window.
                period - now.duration_since(*window.stamps.front().unwrap())
            };

            warn!(
                model = %limits.name,
                delay_secs = wait.as_secs_f64(),
                "rate limit reached, delaying request"
            );
            if !shutdown.sleep(wait).await {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max: u32, period: u64) -> ModelLimits {
        ModelLimits {
            name: "test-model".into(),
            request_limit: max,
            request_limit_period_seconds: period,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn under_the_cap_passes_immediately() {
        let limiters = RateLimiters::new();
        let shutdown = Shutdown::new();
        let before = Instant::now();
        for _ in 0..3 {
            assert!(limiters.acquire(&limits(3, 60), &shutdown).await);
        }
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn over_the_cap_waits_for_the_window() {
        let limiters = RateLimiters::new();
        let shutdown = Shutdown::new();
        let limits = limits(2, 10);

        assert!(limiters.acquire(&limits, &shutdown).await);
        assert!(limiters.acquire(&limits, &shutdown).await);

        let before = Instant::now();
        assert!(limiters.acquire(&limits, &shutdown).await);
        let waited = Instant::now().duration_since(before);
        assert!(waited >= Duration::from_secs(10), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn models_do_not_share_windows() {
        let limiters = RateLimiters::new();
        let shutdown = Shutdown::new();
        let a = limits(1, 60);
        let mut b = limits(1, 60);
        b.name = "other-model".into();

        assert!(limiters.acquire(&a, &shutdown).await);
        let before = Instant::now();
        assert!(limiters.acquire(&b, &shutdown).await);
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_wait() {
        let limiters = RateLimiters::new();
        let shutdown = Shutdown::new();
        let limits = limits(1, 3600);
        assert!(limiters.acquire(&limits, &shutdown).await);

        let waiter = limiters.clone();
        let flag = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.acquire(&limits, &flag).await });
        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown.request();
        assert!(!handle.await.unwrap());
    }
}
