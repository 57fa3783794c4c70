//! The session store implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use support_core::{mask_customer_id, ChatSessionContext};

/// Sessions idle longer than this are discarded.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of customers to track before LRU eviction.
pub const DEFAULT_MAX_CUSTOMERS: usize = 10_000;

/// Per-customer session store with idle expiry and LRU eviction.
///
/// Uses an IndexMap to maintain access order: entries are moved to the end
/// on every access, so the front holds the least recently used customers.
#[derive(Debug)]
pub struct SessionStore {
    /// Map from customer id to their session, in access order.
    sessions: RwLock<IndexMap<String, ChatSessionContext>>,
    /// Idle time after which a session is considered expired.
    idle_timeout: Duration,
    /// Maximum number of customers to track before LRU eviction.
    max_customers: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store with the default idle timeout (30 minutes).
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_CUSTOMERS)
    }

    /// Create a store with custom limits.
    ///
    /// # Arguments
    ///
    /// * `idle_timeout` - Idle time after which a session expires
    /// * `max_customers` - Maximum customers tracked before LRU eviction
    pub fn with_limits(idle_timeout: Duration, max_customers: usize) -> Self {
        Self {
            sessions: RwLock::new(IndexMap::new()),
            idle_timeout,
            max_customers,
        }
    }

    /// The configured idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Fetch the customer's session, creating a fresh one if none exists or
    /// the existing one has expired.
    ///
    /// Every successful fetch updates `last_accessed_at`.
    pub async fn get_or_create(&self, customer_id: &str) -> ChatSessionContext {
        self.get_or_create_at(customer_id, Instant::now()).await
    }

    /// [`get_or_create`](Self::get_or_create) with an explicit clock, the
    /// seam tests drive time through.
    pub async fn get_or_create_at(&self, customer_id: &str, now: Instant) -> ChatSessionContext {
        let mut sessions = self.sessions.write().await;

        // Move to end to mark as recently used (LRU behavior)
        if let Some(mut existing) = sessions.shift_remove(customer_id) {
            if existing.is_expired_at(now, self.idle_timeout) {
                debug!(
                    customer = %mask_customer_id(customer_id),
                    session_id = %existing.session_id,
                    "Discarding expired session"
                );
            } else {
                existing.touch_at(now);
                sessions.insert(customer_id.to_string(), existing.clone());
                return existing;
            }
        }

        let session = ChatSessionContext::new_at(customer_id, now);
        debug!(
            customer = %mask_customer_id(customer_id),
            session_id = %session.session_id,
            "Created session"
        );
        sessions.insert(customer_id.to_string(), session.clone());

        // LRU eviction: drop the oldest customers beyond the limit
        while sessions.len() > self.max_customers {
            sessions.shift_remove_index(0);
        }

        session
    }

    /// Mutate the customer's session under the store lock.
    ///
    /// The closure runs against the live entry, so overlapping requests for
    /// the same customer apply their mutations in sequence instead of
    /// overwriting each other with stale clones. A missing or expired entry
    /// is replaced by a fresh session before the closure runs. Returns the
    /// session as stored.
    pub async fn update<F>(&self, customer_id: &str, mutate: F) -> ChatSessionContext
    where
        F: FnOnce(&mut ChatSessionContext),
    {
        self.update_at(customer_id, Instant::now(), mutate).await
    }

    /// [`update`](Self::update) with an explicit clock.
    pub async fn update_at<F>(
        &self,
        customer_id: &str,
        now: Instant,
        mutate: F,
    ) -> ChatSessionContext
    where
        F: FnOnce(&mut ChatSessionContext),
    {
        let mut sessions = self.sessions.write().await;

        let mut session = match sessions.shift_remove(customer_id) {
            Some(existing) if !existing.is_expired_at(now, self.idle_timeout) => existing,
            _ => ChatSessionContext::new_at(customer_id, now),
        };
        mutate(&mut session);
        session.touch_at(now);
        sessions.insert(customer_id.to_string(), session.clone());

        while sessions.len() > self.max_customers {
            sessions.shift_remove_index(0);
        }

        session
    }

    /// Remove the customer's session. Returns whether one existed.
    ///
    /// Idempotent: removing an absent session is a no-op.
    pub async fn remove(&self, customer_id: &str) -> bool {
        let removed = self.sessions.write().await.shift_remove(customer_id);
        if removed.is_some() {
            debug!(customer = %mask_customer_id(customer_id), "Removed session");
        }
        removed.is_some()
    }

    /// Drop every expired session. Returns the number evicted.
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    /// [`evict_expired`](Self::evict_expired) with an explicit clock.
    pub async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now, self.idle_timeout));
        before - sessions.len()
    }

    /// Current number of tracked customers.
    pub async fn customer_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a periodic eviction sweep over the store.
pub fn spawn_eviction_task(store: Arc<SessionStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                info!(evicted, "Evicted expired sessions");
            }
        }
    })
}
