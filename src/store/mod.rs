//! Delayed-write key-value store.
//!
//! # Data Flow
//! ```text
//! insert(value)
//!     → reserve()            atomic counter, key returned to caller immediately
//!     → schedule_commit()    tracked task: sleep(delay) → write lock → insert
//!
//! lookup(key)
//!     → read lock → committed value or None
//!
//! close(policy)
//!     → Abandon: cancel sleeping commits   | Await: let them land
//!     → wait for the task set to drain
//! ```
//!
//! # Design Decisions
//! - The key counter is lock-free; keys start at 1 and never repeat
//! - Values become visible atomically under the write lock, never partially
//! - "Pending" and "unknown" keys are indistinguishable to readers
//! - Store state is owned by an instance, never global

pub mod delayed;

pub use delayed::DelayedStore;

/// What happens to commits still waiting out their delay when the store closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Cancel pending commits; their keys never become readable.
    #[default]
    Abandon,
    /// Wait for every pending commit to land.
    Await,
}

impl DrainPolicy {
    pub fn from_await(await_pending: bool) -> Self {
        if await_pending {
            Self::Await
        } else {
            Self::Abandon
        }
    }
}
