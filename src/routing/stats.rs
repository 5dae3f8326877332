//! Per-route request statistics.
//!
//! Each route owns one `RouteStats` cell behind its own lock, so a slow reader on
//! one route never blocks request accounting on another.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Point-in-time copy of a route's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub total_time_micros: u64,
}

impl StatsSnapshot {
    /// Average handler latency in microseconds, 0 before the first request.
    pub fn average_micros(&self) -> u64 {
        self.total_time_micros
            .checked_div(self.total_requests)
            .unwrap_or(0)
    }
}

/// Mutable stats cell of a single route.
#[derive(Debug, Default)]
pub struct RouteStats {
    inner: RwLock<StatsSnapshot>,
}

impl RouteStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one handled request that took `elapsed`.
    pub fn record(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        // Both counters move under one write lock so readers never see a request
        // counted without its time.
        let mut stats = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        stats.total_requests = stats.total_requests.saturating_add(1);
        stats.total_time_micros = stats.total_time_micros.saturating_add(micros);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
