//! Running token-usage counters shared by every call on a client

use std::sync::Mutex;

use crate::types::RequestUsage;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    actual: RequestUsage,
    total: RequestUsage,
}

/// Actual and total usage for the lifetime of a client
///
/// Both counters start at zero and only grow. `total` would also count cached
/// responses; without a cache the two stay equal.
#[derive(Debug, Default)]
pub struct UsageTracker {
    counters: Mutex<Counters>,
}

impl UsageTracker {
    /// Tracker with both counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a completed call's usage to both counters
    pub fn merge(&self, usage: RequestUsage) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.actual += usage;
        counters.total += usage;
    }

    /// Usage of requests that reached the vendor
    pub fn actual(&self) -> RequestUsage {
        self.counters.lock().unwrap_or_else(|e| e.into_inner()).actual
    }

    /// Usage of all requests, cached or not
    pub fn total(&self) -> RequestUsage {
        self.counters.lock().unwrap_or_else(|e| e.into_inner()).total
    }
}
