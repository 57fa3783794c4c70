//! Idle-expiring per-customer session storage.
//!
//! This crate provides [`SessionStore`], the shared customer -> session map
//! behind the pipeline. Keying is always by customer id, so a logged-out or
//! expired customer transparently gets a new conversation. Create-or-get is
//! atomic per customer: the map's write lock covers the whole
//! check-expire-create step, so two concurrent requests for the same
//! "missing" customer never both construct a session. Mutations go through
//! a lock-scoped update closure applied to the live entry, so overlapping
//! requests for one customer cannot overwrite each other with stale reads.
//!
//! To bound memory against traffic from many unique customers, the store
//! also limits the number of tracked customers and evicts the least
//! recently used entries when the limit is reached.

mod store;

pub use store::{spawn_eviction_task, SessionStore, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_CUSTOMERS};
