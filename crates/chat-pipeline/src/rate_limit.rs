//! Per-customer request admission control.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Default admissions per customer per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 15;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Map size above which stale counters are reclaimed on insert.
const RECLAIM_THRESHOLD: usize = 1024;

/// One customer's counter for the current window.
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// Fixed-window rate limiter keyed by customer id.
///
/// A fixed window bounds burst rate, which is all the admission contract
/// requires; perfect fairness at window boundaries is not a goal. The
/// increment-and-check runs under the map's write lock, so concurrent
/// requests from the same customer are counted atomically. Counters for
/// customers with no recent activity are reclaimed once the map grows past
/// a threshold, keeping the backing store bounded.
#[derive(Debug)]
pub struct RateLimiter {
    counters: RwLock<HashMap<String, WindowCounter>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    /// Create a limiter with the default policy (15 per customer per minute).
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }

    /// Create a limiter with a custom policy.
    pub fn with_limits(max_requests: u32, window: Duration) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Try to admit one request for the customer.
    pub async fn admit(&self, customer_id: &str) -> bool {
        self.admit_at(customer_id, Instant::now()).await
    }

    /// [`admit`](Self::admit) with an explicit clock, the seam tests drive
    /// time through.
    pub async fn admit_at(&self, customer_id: &str, now: Instant) -> bool {
        let mut counters = self.counters.write().await;

        if let Some(counter) = counters.get_mut(customer_id) {
            if now.saturating_duration_since(counter.window_start) >= self.window {
                // New window
                counter.window_start = now;
                counter.count = 1;
                return true;
            }
            if counter.count < self.max_requests {
                counter.count += 1;
                return true;
            }
            return false;
        }

        if counters.len() >= RECLAIM_THRESHOLD {
            let window = self.window;
            counters.retain(|_, c| now.saturating_duration_since(c.window_start) < window);
        }

        counters.insert(
            customer_id.to_string(),
            WindowCounter {
                window_start: now,
                count: 1,
            },
        );
        true
    }

    /// Number of customers with a live counter.
    pub async fn tracked_customers(&self) -> usize {
        self.counters.read().await.len()
    }
}
