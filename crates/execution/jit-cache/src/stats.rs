//! Cheap counters for the dispatcher and the execution front-end.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live dispatcher counters. Updated with relaxed atomics on the worker
/// paths; read through `snapshot`.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    submitted: AtomicU64,
    compiled: AtomicU64,
    failed: AtomicU64,
}

impl DispatcherStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compiled(&self) {
        self.compiled.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Release);
    }

    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        // Completion counts are read first, pairing their release
        // increments, so a snapshot never shows more completions than
        // submissions.
        let compiled = self.compiled.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);
        DispatcherStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            compiled,
            failed,
        }
    }
}

/// Point-in-time dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStatsSnapshot {
    /// Jobs accepted into the queue.
    pub submitted: u64,
    /// Jobs that produced an artifact.
    pub compiled: u64,
    /// Jobs that ended in a compilation failure.
    pub failed: u64,
}

impl DispatcherStatsSnapshot {
    /// Jobs still queued or compiling. Saturates rather than trusting the
    /// three counters to be mutually consistent.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.compiled + self.failed)
    }
}

/// Per-runner execution counters.
#[derive(Debug, Default)]
pub struct RunnerStats {
    interpreted: AtomicU64,
    executed_l1: AtomicU64,
    executed_l2: AtomicU64,
    folded: AtomicU64,
}

impl RunnerStats {
    pub(crate) fn record_interpreted(&self) {
        self.interpreted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed_l1(&self) {
        self.executed_l1.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed_l2(&self) {
        self.executed_l2.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_folded(&self) {
        self.folded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunnerStatsSnapshot {
        RunnerStatsSnapshot {
            interpreted: self.interpreted.load(Ordering::Relaxed),
            executed_l1: self.executed_l1.load(Ordering::Relaxed),
            executed_l2: self.executed_l2.load(Ordering::Relaxed),
            folded: self.folded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time runner counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerStatsSnapshot {
    /// Calls served by the interpreter (local cache miss).
    pub interpreted: u64,
    /// Calls served by an L1 artifact.
    pub executed_l1: u64,
    /// Calls served by an L2 artifact.
    pub executed_l2: u64,
    /// Artifacts merged from the global stores into the local cache.
    pub folded: u64,
}

impl RunnerStatsSnapshot {
    pub fn total_calls(&self) -> u64 {
        self.interpreted + self.executed_l1 + self.executed_l2
    }
}
