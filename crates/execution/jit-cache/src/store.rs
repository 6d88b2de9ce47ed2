//! Global per-tier artifact store.
//!
//! One instance per tier, shared by every execution thread and the
//! synchronizer. The map is never exposed; callers get exactly the
//! reservation, lookup and snapshot primitives. Entries are handles, so a
//! method shows up here as soon as its compilation is dispatched, not when
//! it finishes. Entries are never removed, including after a failed
//! compilation: the poisoned slot is what keeps the at-most-one-job
//! invariant.

use std::collections::HashMap;

use jit_core::{MethodId, Tier};
use parking_lot::RwLock;

use crate::handle::CompileHandle;

pub struct GlobalTierStore {
    tier: Tier,
    entries: RwLock<HashMap<MethodId, CompileHandle>>,
}

impl GlobalTierStore {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Check-then-insert under the write lock: if no entry exists for
    /// `method`, insert a fresh pending handle and return it; the caller is
    /// then obligated to dispatch exactly one job resolving that handle. If
    /// an entry already exists (pending, ready or failed) returns `None` and
    /// nothing must be dispatched.
    pub fn try_reserve(&self, method: MethodId) -> Option<CompileHandle> {
        let mut entries = self.entries.write();
        if entries.contains_key(&method) {
            return None;
        }
        let handle = CompileHandle::pending(method, self.tier);
        entries.insert(method, handle.clone());
        Some(handle)
    }

    /// Handle for `method` if one was ever reserved. Concurrent-read safe.
    pub fn get(&self, method: MethodId) -> Option<CompileHandle> {
        self.entries.read().get(&method).cloned()
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.entries.read().contains_key(&method)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Point-in-time copy of the map for iteration without holding the
    /// lock. Handle clones are cheap reference bumps.
    pub fn snapshot(&self) -> HashMap<MethodId, CompileHandle> {
        self.entries.read().clone()
    }
}
