//! Bounded compilation worker pool.
//!
//! A fixed number of OS threads pull jobs from a FIFO queue and invoke the
//! external compiler. Admission order is FIFO; completion order is not.
//! Workers never submit jobs themselves, so a pool slot is never held
//! waiting on another compilation. There is no cancellation: a submitted
//! job runs to completion or failure, and a hung compiler call stalls only
//! its own slot.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jit_core::{CompilationEngine, CompileError, MethodId, Tier};
use log::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::handle::CompileHandle;
use crate::stats::{DispatcherStats, DispatcherStatsSnapshot};

struct CompileJob {
    method: MethodId,
    tier: Tier,
    handle: CompileHandle,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<CompileJob>,
    shutdown: bool,
}

struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

pub struct CompileDispatcher {
    queue: Arc<JobQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<DispatcherStats>,
}

impl CompileDispatcher {
    /// Spawn `thread_bound` workers over a shared FIFO queue.
    pub fn new(thread_bound: usize, compiler: Arc<dyn CompilationEngine>) -> Self {
        let thread_bound = thread_bound.max(1);
        let queue = Arc::new(JobQueue {
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
        });
        let stats = Arc::new(DispatcherStats::default());

        let mut workers = Vec::with_capacity(thread_bound);
        for worker_id in 0..thread_bound {
            let queue = Arc::clone(&queue);
            let compiler = Arc::clone(&compiler);
            let stats = Arc::clone(&stats);
            let handle = thread::Builder::new()
                .name(format!("jit-compile-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &queue, &*compiler, &stats))
                .expect("failed to spawn compilation worker");
            workers.push(handle);
        }

        debug!("compile dispatcher started with {thread_bound} workers");
        Self {
            queue,
            workers: Mutex::new(workers),
            stats,
        }
    }

    /// Enqueue a compilation job for `(method, tier)` resolving `handle`.
    /// Non-blocking. After shutdown the handle is failed immediately with
    /// `PoolShutdown` instead of being left pending forever.
    pub fn submit(&self, method: MethodId, tier: Tier, handle: CompileHandle) {
        let mut state = self.queue.state.lock();
        if state.shutdown {
            drop(state);
            warn!("rejecting compilation of {method} at {tier}: pool is shut down");
            handle.fulfill(Err(CompileError::PoolShutdown));
            return;
        }
        state.pending.push_back(CompileJob {
            method,
            tier,
            handle,
        });
        // Recorded before the lock drops: a worker cannot complete a job
        // whose submission is not yet counted.
        self.stats.record_submitted();
        drop(state);
        self.queue.available.notify_one();
        trace!("queued compilation of {method} at {tier}");
    }

    pub fn queue_length(&self) -> usize {
        self.queue.state.lock().pending.len()
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop accepting jobs, let the workers drain the queue, and join them.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.queue.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.queue.available.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            let _ = worker.join();
        }
        debug!("compile dispatcher shut down");
    }
}

impl Drop for CompileDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    worker_id: usize,
    queue: &JobQueue,
    compiler: &dyn CompilationEngine,
    stats: &DispatcherStats,
) {
    loop {
        let job = {
            let mut state = queue.state.lock();
            loop {
                // Drain remaining jobs even when shutting down, so every
                // accepted handle resolves.
                if let Some(job) = state.pending.pop_front() {
                    break Some(job);
                }
                if state.shutdown {
                    break None;
                }
                queue.available.wait(&mut state);
            }
        };

        let Some(job) = job else {
            trace!("compile worker {worker_id} exiting");
            return;
        };

        let outcome = compiler.compile(job.method, job.tier);
        match &outcome {
            Ok(artifact) => {
                stats.record_compiled();
                trace!(
                    "worker {worker_id} compiled {} at {} ({} bytes)",
                    job.method,
                    job.tier,
                    artifact.code.len()
                );
            }
            Err(err) => {
                stats.record_failed();
                warn!("worker {worker_id} failed to compile {} at {}: {err}", job.method, job.tier);
            }
        }
        job.handle.fulfill(outcome);
    }
}
