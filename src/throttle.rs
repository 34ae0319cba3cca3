use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

/// Client-side request budget: at most `threshold` admissions within any
/// rolling `window`.
///
/// The default of 30 requests per second mirrors the quota the Cloud
/// Office API enforces server-side; staying under it keeps requests from
/// ever seeing the server's throttle response.
#[derive(Clone, Copy, Debug)]
pub struct RateLimit {
    pub threshold: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            threshold: 30,
            window: Duration::from_secs(1),
        }
    }
}

/// Shared admission window. One instance lives for the client's lifetime
/// and every in-flight request goes through it.
#[derive(Debug)]
pub(crate) struct RequestWindow {
    limit: RateLimit,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    ends_at: Instant,
    admitted: u32,
}

impl RequestWindow {
    pub(crate) fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            // Start expired so the first acquisition opens a fresh window.
            state: Mutex::new(WindowState {
                ends_at: Instant::now(),
                admitted: 0,
            }),
        }
    }

    /// Suspends until the current window has budget for one more request.
    /// Never fails; callers are delayed, not rejected.
    pub(crate) async fn acquire(&self) {
        loop {
            // Re-evaluate after every sleep: the window may have rolled
            // over again, or another waiter may have taken the refreshed
            // budget first.
            match self.try_admit() {
                None => return,
                Some(delay) => {
                    debug!(delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "request budget exhausted, delaying");
                    time::sleep(delay).await;
                }
            }
        }
    }

    /// One admission check under the lock. Returns `None` when admitted,
    /// or how long to wait before re-checking. No await happens while the
    /// lock is held.
    fn try_admit(&self) -> Option<Duration> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if now >= state.ends_at {
            state.ends_at = now + self.limit.window;
            state.admitted = 0;
        }
        state.admitted += 1;
        (state.admitted > self.limit.threshold)
            .then(|| state.ends_at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(threshold: u32) -> RateLimit {
        RateLimit {
            threshold,
            window: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_threshold_immediately() {
        let window = RequestWindow::new(limit(3));
        let start = Instant::now();
        for _ in 0..3 {
            window.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO, "threshold admissions must not wait");
    }

    #[tokio::test(start_paused = true)]
    async fn delays_excess_until_the_window_boundary() {
        let window = RequestWindow::new(limit(3));
        let start = Instant::now();
        for _ in 0..4 {
            window.acquire().await;
        }
        assert_eq!(
            start.elapsed(),
            Duration::from_secs(1),
            "the fourth acquisition must wait out the window"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn budget_refreshes_after_the_window_expires() {
        let window = RequestWindow::new(limit(2));
        let start = Instant::now();
        window.acquire().await;
        window.acquire().await;

        time::sleep(Duration::from_secs(2)).await;

        window.acquire().await;
        window.acquire().await;
        assert_eq!(
            start.elapsed(),
            Duration::from_secs(2),
            "a fresh window admits without extra delay"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_are_spread_across_windows() {
        let window = RequestWindow::new(limit(1));
        let start = Instant::now();
        tokio::join!(window.acquire(), window.acquire(), window.acquire());
        assert_eq!(
            start.elapsed(),
            Duration::from_secs(2),
            "each waiter past the threshold lands in a later window"
        );
    }
}
