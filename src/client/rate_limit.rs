//! Minimum-spacing gate for upstream calls

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum interval between consecutive upstream calls
///
/// The timestamp of the previous call lives behind an async mutex that is held
/// across the wait, so concurrent callers on one limiter queue up in lock
/// order and each one still observes the full interval.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous call
    ///
    /// The new timestamp is recorded after the wait completes.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limiting");
                sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
