//! Adaptive tiered compilation cache.
//!
//! Lets many execution threads share compiled-code artifacts per method
//! while each thread decides locally, without blocking, whether to
//! interpret, run a cached artifact, or leave (re)compilation to the
//! background promoter:
//!
//! - Two-tier cache (L1/L2) with hotness-driven promotion
//! - Shared global stores layered under unsynchronized thread-local caches
//! - Asynchronous compilation jobs, at most one per (method, tier)
//! - Background synchronizer keeping local views eventually consistent
//!
//! The cache only grows: no eviction, no de-promotion, no persistence.
//!
//! ```
//! use std::sync::Arc;
//! use jit_cache::{CacheConfig, JitCache};
//! use jit_core::{
//!     CompilationEngine, CompileError, CompiledArtifact, ExecutionEngine,
//!     ExecutionResult, MethodId, Tier,
//! };
//!
//! struct Host;
//! impl ExecutionEngine for Host {
//!     fn execute(&self, artifact: &CompiledArtifact) -> ExecutionResult {
//!         ExecutionResult(artifact.method.0)
//!     }
//!     fn interpret(&self, method: MethodId) -> ExecutionResult {
//!         ExecutionResult(method.0)
//!     }
//! }
//! impl CompilationEngine for Host {
//!     fn compile_l1(&self, method: MethodId) -> Result<CompiledArtifact, CompileError> {
//!         Ok(CompiledArtifact::new(method, Tier::L1, vec![]))
//!     }
//!     fn compile_l2(&self, method: MethodId) -> Result<CompiledArtifact, CompileError> {
//!         Ok(CompiledArtifact::new(method, Tier::L2, vec![]))
//!     }
//! }
//!
//! let host = Arc::new(Host);
//! let cache = JitCache::new(CacheConfig::default(), host.clone(), host);
//! cache.start();
//! let mut runner = cache.runner();
//! let result = runner.execute_method(MethodId(1));
//! assert_eq!(result, ExecutionResult(1));
//! cache.stop();
//! ```

pub mod config;
pub mod dispatch;
pub mod handle;
pub mod hotness;
pub mod local;
pub mod runner;
pub mod stats;
pub mod store;
mod sync;

#[cfg(test)]
mod testutil;

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use jit_core::{CompilationEngine, ExecutionEngine, Tier};
use log::debug;
use parking_lot::Mutex;

pub use config::CacheConfig;
pub use dispatch::CompileDispatcher;
pub use handle::{CompileHandle, HandlePoll};
pub use hotness::HotnessTracker;
pub use local::{LocalCache, LocalLookup};
pub use runner::MethodRunner;
pub use stats::{DispatcherStatsSnapshot, RunnerStatsSnapshot};
pub use store::GlobalTierStore;

use sync::SyncWorker;

/// Process-wide shared state: hotness, both global tier stores, the host
/// capabilities, the lazily created dispatcher and the synchronizer
/// lifecycle. Cloned around as `Arc<JitCache>`; per-thread front-ends are
/// obtained through [`JitCache::runner`].
pub struct JitCache {
    // Set by `new_cyclic`; lets `&self` methods hand out owning references.
    self_ref: Weak<JitCache>,
    config: CacheConfig,
    hotness: HotnessTracker,
    l1_store: GlobalTierStore,
    l2_store: GlobalTierStore,
    exec: Arc<dyn ExecutionEngine>,
    compiler: Arc<dyn CompilationEngine>,
    dispatcher: OnceLock<Arc<CompileDispatcher>>,
    synchronizer: Mutex<Option<SyncWorker>>,
}

impl JitCache {
    pub fn new(
        config: CacheConfig,
        exec: Arc<dyn ExecutionEngine>,
        compiler: Arc<dyn CompilationEngine>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            config,
            hotness: HotnessTracker::new(),
            l1_store: GlobalTierStore::new(Tier::L1),
            l2_store: GlobalTierStore::new(Tier::L2),
            exec,
            compiler,
            dispatcher: OnceLock::new(),
            synchronizer: Mutex::new(None),
        })
    }

    fn strong_self(&self) -> Arc<Self> {
        // Callers can only reach `&self` through the Arc returned by `new`,
        // so the upgrade cannot fail outside of Drop.
        self.self_ref.upgrade().expect("JitCache accessed during teardown")
    }

    /// Per-thread execution front-end. The first runner constructed wins
    /// the one-shot dispatcher initialization; later callers observe the
    /// same pool.
    pub fn runner(&self) -> MethodRunner {
        let _ = self.dispatcher();
        MethodRunner::new(self.strong_self())
    }

    /// Start the background synchronizer. No-op if already running.
    pub fn start(&self) {
        let mut slot = self.synchronizer.lock();
        if slot.is_none() {
            let interval = Duration::from_micros(self.config.sync_interval_us);
            *slot = Some(SyncWorker::spawn(self.self_ref.clone(), interval));
            debug!("cache synchronizer started ({}us cycle)", self.config.sync_interval_us);
        }
    }

    /// Stop and join the background synchronizer. No-op if not running.
    pub fn stop(&self) {
        if let Some(worker) = self.synchronizer.lock().take() {
            worker.stop();
            debug!("cache synchronizer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.synchronizer.lock().is_some()
    }

    /// Full teardown for hosts that want a clean exit: stops the
    /// synchronizer and drains the compilation pool.
    pub fn shutdown(&self) {
        self.stop();
        if let Some(dispatcher) = self.dispatcher.get() {
            dispatcher.shutdown();
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn hotness(&self) -> &HotnessTracker {
        &self.hotness
    }

    pub fn store(&self, tier: Tier) -> &GlobalTierStore {
        match tier {
            Tier::L1 => &self.l1_store,
            Tier::L2 => &self.l2_store,
        }
    }

    pub fn execution_engine(&self) -> &dyn ExecutionEngine {
        &*self.exec
    }

    pub fn dispatcher_stats(&self) -> DispatcherStatsSnapshot {
        self.dispatcher().stats()
    }

    /// The shared compilation pool, created on first use.
    pub(crate) fn dispatcher(&self) -> &Arc<CompileDispatcher> {
        self.dispatcher.get_or_init(|| {
            Arc::new(CompileDispatcher::new(
                self.config.compilation_thread_bound,
                Arc::clone(&self.compiler),
            ))
        })
    }
}

impl Drop for JitCache {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.get() {
            dispatcher.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingCompiler, TaggedExecutor};
    use jit_core::MethodId;

    fn host_cache() -> Arc<JitCache> {
        JitCache::new(
            CacheConfig {
                compilation_thread_bound: 2,
                l1_threshold: 10,
                l2_threshold: 100,
                sync_interval_us: 100,
            },
            Arc::new(TaggedExecutor),
            Arc::new(CountingCompiler::instant()),
        )
    }

    #[test]
    fn runners_share_one_dispatcher() {
        let cache = host_cache();
        let _a = cache.runner();
        let first = Arc::clone(cache.dispatcher());
        let _b = cache.runner();
        assert!(Arc::ptr_eq(&first, cache.dispatcher()));
    }

    #[test]
    fn start_is_idempotent() {
        let cache = host_cache();
        cache.start();
        cache.start();
        assert!(cache.is_running());
        cache.stop();
        assert!(!cache.is_running());
        cache.stop();
    }

    #[test]
    fn stores_are_independent_per_tier() {
        let cache = host_cache();
        cache.store(Tier::L1).try_reserve(MethodId(1));
        assert!(cache.store(Tier::L1).contains(MethodId(1)));
        assert!(!cache.store(Tier::L2).contains(MethodId(1)));
    }

    #[test]
    fn shutdown_is_safe_without_start() {
        let cache = host_cache();
        cache.shutdown();
        cache.shutdown();
    }
}
