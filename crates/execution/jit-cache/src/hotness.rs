//! Shared invocation-frequency tracking.
//!
//! One counter per method, monotonically increasing for the lifetime of the
//! process. The tracker is the promotion signal for the synchronizer: a
//! method whose counter crosses a tier threshold becomes a compilation
//! candidate. There is no removal and no decay.

use std::collections::HashMap;

use jit_core::MethodId;
use parking_lot::RwLock;

/// Thread-safe map from method identity to cumulative invocation count.
#[derive(Debug, Default)]
pub struct HotnessTracker {
    counters: RwLock<HashMap<MethodId, u64>>,
}

impl HotnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of `method`. Creates the counter at zero first
    /// if absent. The read-modify-write happens under the write lock, so
    /// concurrent callers never lose an update.
    pub fn touch(&self, method: MethodId) {
        let mut counters = self.counters.write();
        *counters.entry(method).or_insert(0) += 1;
    }

    /// Current invocation count, or 0 if the method was never touched.
    pub fn read(&self, method: MethodId) -> u64 {
        self.counters.read().get(&method).copied().unwrap_or(0)
    }

    /// Point-in-time copy of every counter, for iteration without holding
    /// the lock.
    pub fn snapshot(&self) -> HashMap<MethodId, u64> {
        self.counters.read().clone()
    }
}
