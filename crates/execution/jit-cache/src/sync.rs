//! Background promotion worker.
//!
//! The synchronizer is the only party that initiates compilation. Each
//! cycle it snapshots hotness and both global stores, reserves and
//! dispatches promotions for methods that crossed a tier threshold, then
//! sleeps. Snapshots are dropped at cycle end, so an indefinitely running
//! worker accumulates no per-cycle state. The reservation protocol in the
//! global store is what enforces at-most-one job per (method, tier) even if
//! promotion decisions were ever raced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use jit_core::{MethodId, Tier};
use log::{debug, trace};

use crate::JitCache;

/// One promotion pass: scan the hotness snapshot and dispatch compilation
/// for every method that qualifies for a tier it does not yet have a global
/// entry for. L2 takes priority; a method that qualifies for L2 is not
/// separately considered for L1 in the same cycle.
pub(crate) fn promotion_cycle(cache: &JitCache) {
    let hotness = cache.hotness().snapshot();
    let l1_resident = cache.store(Tier::L1).snapshot();
    let l2_resident = cache.store(Tier::L2).snapshot();

    for (method, count) in hotness {
        if count > cache.config().l2_threshold {
            if !l2_resident.contains_key(&method) {
                reserve_and_submit(cache, method, Tier::L2, count);
            }
        } else if count > cache.config().l1_threshold && !l1_resident.contains_key(&method) {
            reserve_and_submit(cache, method, Tier::L1, count);
        }
    }
}

fn reserve_and_submit(cache: &JitCache, method: MethodId, tier: Tier, count: u64) {
    // The snapshot may be stale; the reservation is authoritative.
    if let Some(handle) = cache.store(tier).try_reserve(method) {
        debug!("promoting {method} to {tier} at hotness {count}");
        cache.dispatcher().submit(method, tier, handle);
    }
}

/// Handle to the running synchronizer thread.
pub(crate) struct SyncWorker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Spawn the promotion loop. The worker holds only a weak reference to
    /// the cache, so dropping every strong reference also ends the loop.
    pub(crate) fn spawn(cache: Weak<JitCache>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("jit-cache-sync".into())
            .spawn(move || {
                trace!("cache synchronizer started");
                while !stop_flag.load(Ordering::Acquire) {
                    let Some(cache) = cache.upgrade() else {
                        break;
                    };
                    promotion_cycle(&cache);
                    drop(cache);
                    thread::sleep(interval);
                }
                trace!("cache synchronizer stopped");
            })
            .expect("failed to spawn cache synchronizer");

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Signal cancellation and join the thread.
    pub(crate) fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
