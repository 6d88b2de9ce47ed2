//! Per-thread execution front-end.
//!
//! A `MethodRunner` owns one thread's local cache and drives the per-call
//! state machine: local lookup, execute-or-interpret, hotness record, then
//! fold completed global entries into the local view. The call never blocks
//! on compilation; a pending or failed global entry is treated the same as
//! an absent one.

use std::sync::Arc;

use jit_core::{CompiledArtifact, ExecutionResult, MethodId, Tier};
use log::trace;

use crate::handle::HandlePoll;
use crate::local::{LocalCache, LocalLookup};
use crate::stats::{RunnerStats, RunnerStatsSnapshot};
use crate::JitCache;

pub struct MethodRunner {
    cache: Arc<JitCache>,
    local: LocalCache,
    stats: RunnerStats,
}

impl MethodRunner {
    pub(crate) fn new(cache: Arc<JitCache>) -> Self {
        Self {
            cache,
            local: LocalCache::new(),
            stats: RunnerStats::default(),
        }
    }

    /// Run `method`, preferring the best locally resident artifact and
    /// falling back to interpretation. Always records one hotness tick and
    /// pulls completed global compilations into the local cache before
    /// returning.
    pub fn execute_method(&mut self, method: MethodId) -> ExecutionResult {
        let looked_up = self.local.lookup(method);

        let result = match &looked_up {
            LocalLookup::L2(artifact) => {
                self.stats.record_executed_l2();
                self.cache.execution_engine().execute(artifact)
            }
            LocalLookup::L1(artifact) => {
                self.stats.record_executed_l1();
                self.cache.execution_engine().execute(artifact)
            }
            LocalLookup::Empty => {
                self.stats.record_interpreted();
                self.cache.execution_engine().interpret(method)
            }
        };

        self.cache.hotness().touch(method);
        self.fold_completed();
        result
    }

    /// Merge every resolved global handle this thread has not yet seen.
    /// Pending and failed handles are skipped; the merge is idempotent.
    fn fold_completed(&mut self) {
        for tier in [Tier::L2, Tier::L1] {
            for (method, handle) in self.cache.store(tier).snapshot() {
                if self.local.contains(method, tier) {
                    continue;
                }
                if let HandlePoll::Ready(artifact) = handle.poll() {
                    if self.local.merge(method, tier, artifact) {
                        self.stats.record_folded();
                        trace!("folded {method} at {tier} into local cache");
                    }
                }
            }
        }
    }

    /// Locally resident artifact for an exact tier, if any.
    pub fn cached(&self, method: MethodId, tier: Tier) -> Option<&Arc<CompiledArtifact>> {
        self.local.get(method, tier)
    }

    /// Best locally resident tier for `method`.
    pub fn resident_tier(&self, method: MethodId) -> Option<Tier> {
        self.local.lookup(method).tier()
    }

    pub fn stats(&self) -> RunnerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache(&self) -> &Arc<JitCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::sync::promotion_cycle;
    use crate::testutil::{executed, interpreted, CountingCompiler, TaggedExecutor};
    use std::time::{Duration, Instant};

    fn test_cache(l1: u64, l2: u64) -> Arc<JitCache> {
        JitCache::new(
            CacheConfig {
                compilation_thread_bound: 2,
                l1_threshold: l1,
                l2_threshold: l2,
                sync_interval_us: 100,
            },
            Arc::new(TaggedExecutor),
            Arc::new(CountingCompiler::instant()),
        )
    }

    #[test]
    fn cold_call_interprets_and_records_hotness() {
        let cache = test_cache(10, 100);
        let mut runner = cache.runner();

        let result = runner.execute_method(MethodId(1));
        assert_eq!(result, interpreted(MethodId(1)));
        assert_eq!(cache.hotness().read(MethodId(1)), 1);
        assert_eq!(runner.stats().interpreted, 1);
    }

    #[test]
    fn eventually_executes_compiled_artifact() {
        let cache = test_cache(10, 1_000_000);
        let mut runner = cache.runner();
        let method = MethodId(2);

        for _ in 0..11 {
            runner.execute_method(method);
        }
        promotion_cycle(&cache);

        // Keep calling until the dispatcher resolves the handle and the
        // fold picks it up.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut result = runner.execute_method(method);
        while Instant::now() < deadline && result != executed(method, Tier::L1) {
            std::thread::sleep(Duration::from_millis(1));
            result = runner.execute_method(method);
        }
        assert_eq!(result, executed(method, Tier::L1));
        assert_eq!(runner.resident_tier(method), Some(Tier::L1));
    }

    #[test]
    fn failed_compilation_keeps_interpreting() {
        let compiler = Arc::new(CountingCompiler::failing());
        let cache = JitCache::new(
            CacheConfig {
                compilation_thread_bound: 1,
                l1_threshold: 5,
                l2_threshold: 50,
                sync_interval_us: 100,
            },
            Arc::new(TaggedExecutor),
            Arc::clone(&compiler) as Arc<dyn jit_core::CompilationEngine>,
        );
        let mut runner = cache.runner();
        let method = MethodId(3);

        for _ in 0..6 {
            runner.execute_method(method);
        }
        promotion_cycle(&cache);

        // Let the failure land, then keep going: every call still
        // interprets and the slot is never retried.
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline && cache.dispatcher_stats().failed == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        for _ in 0..20 {
            assert_eq!(runner.execute_method(method), interpreted(method));
            promotion_cycle(&cache);
        }
        assert_eq!(cache.dispatcher_stats().submitted, 1);
        assert_eq!(compiler.calls(Tier::L1), 1);
        assert!(runner.cached(method, Tier::L1).is_none());
    }

    #[test]
    fn fold_skips_pending_handles() {
        let cache = JitCache::new(
            CacheConfig {
                compilation_thread_bound: 1,
                l1_threshold: 5,
                l2_threshold: 50,
                sync_interval_us: 100,
            },
            Arc::new(TaggedExecutor),
            Arc::new(CountingCompiler::slow(Duration::from_millis(200))),
        );
        let mut runner = cache.runner();
        let method = MethodId(4);

        for _ in 0..6 {
            runner.execute_method(method);
        }
        promotion_cycle(&cache);

        // Compilation is still in flight; the fold must not block on it.
        let result = runner.execute_method(method);
        assert_eq!(result, interpreted(method));
        assert!(runner.cached(method, Tier::L1).is_none());
    }
}
