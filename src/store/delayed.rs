//! The delayed store implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::DrainPolicy;
use crate::observability::metrics;

/// A map from issued handles to values that appear after a delay.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Debug, Clone)]
pub struct DelayedStore<V> {
    inner: Arc<Inner<V>>,
}

#[derive(Debug)]
struct Inner<V> {
    counter: AtomicU64,
    entries: RwLock<HashMap<u64, V>>,
    delay: Duration,
    commits: TaskTracker,
    cancel: CancellationToken,
}

impl<V> Inner<V> {
    fn commit(&self, key: u64, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }
}

impl<V> DelayedStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty store whose `insert` commits after `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                counter: AtomicU64::new(0),
                entries: RwLock::new(HashMap::new()),
                delay,
                commits: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// The default commit delay used by [`insert`](Self::insert).
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Issue a new key. Keys start at 1 and strictly increase.
    pub fn reserve(&self) -> u64 {
        self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Make `value` readable under `key` once `delay` has elapsed.
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    pub fn schedule_commit(&self, key: u64, value: V, delay: Duration) {
        let inner = Arc::clone(&self.inner);
        let cancel = self.inner.cancel.clone();
        self.inner.commits.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    inner.commit(key, value);
                    metrics::record_commit();
                    tracing::debug!(key, "Value committed");
                }
                _ = cancel.cancelled() => {
                    metrics::record_commit_abandoned();
                    tracing::debug!(key, "Pending commit abandoned");
                }
            }
        });
    }

    /// Reserve a key and commit `value` to it after the store's default delay.
    pub fn insert(&self, value: V) -> u64 {
        self.insert_after(value, self.inner.delay)
    }

    /// Reserve a key and commit `value` to it after `delay`.
    pub fn insert_after(&self, value: V, delay: Duration) -> u64 {
        let key = self.reserve();
        self.schedule_commit(key, value, delay);
        key
    }

    /// The committed value for `key`, if any.
    pub fn lookup(&self, key: u64) -> Option<V> {
        let entries = self.inner.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).cloned()
    }

    /// Highest key issued so far (0 before the first reservation).
    pub fn issued(&self) -> u64 {
        self.inner.counter.load(Ordering::Relaxed)
    }

    /// Number of committed values.
    pub fn committed(&self) -> usize {
        self.inner.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of commits still waiting out their delay.
    pub fn pending(&self) -> usize {
        self.inner.commits.len()
    }

    /// Stop tracking new work and settle pending commits according to `policy`.
    pub async fn close(&self, policy: DrainPolicy) {
        let pending = self.pending();
        tracing::info!(pending, committed = self.committed(), policy = ?policy, "Closing store");

        self.inner.commits.close();
        if policy == DrainPolicy::Abandon {
            self.inner.cancel.cancel();
        }
        self.inner.commits.wait().await;
    }
}
