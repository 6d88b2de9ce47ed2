//! Asynchronous compilation handles.
//!
//! A `CompileHandle` is the promise half of a dispatched compilation job:
//! it is inserted into the global store while the job is still queued, and
//! resolved by whichever worker thread runs the job. Observers poll it
//! non-blockingly; `wait` exists for the rare consumer that has confirmed
//! it needs the resolved value.

use std::sync::Arc;

use jit_core::{CompileError, CompiledArtifact, MethodId, Tier};
use parking_lot::{Condvar, Mutex};

/// Observable state of a handle at one instant.
#[derive(Debug, Clone)]
pub enum HandlePoll {
    /// Job queued or still compiling.
    Pending,
    /// Compilation finished; the artifact is shared with all observers.
    Ready(Arc<CompiledArtifact>),
    /// Compilation failed; the slot stays poisoned, there is no retry.
    Failed(CompileError),
}

impl HandlePoll {
    pub fn is_pending(&self) -> bool {
        matches!(self, HandlePoll::Pending)
    }

    /// The artifact if the handle resolved successfully.
    pub fn ready(&self) -> Option<&Arc<CompiledArtifact>> {
        match self {
            HandlePoll::Ready(artifact) => Some(artifact),
            _ => None,
        }
    }
}

enum HandleState {
    Pending,
    Ready(Arc<CompiledArtifact>),
    Failed(CompileError),
}

struct HandleShared {
    method: MethodId,
    tier: Tier,
    state: Mutex<HandleState>,
    resolved: Condvar,
}

/// Shared pending-or-ready artifact slot. Cloning shares the same slot.
#[derive(Clone)]
pub struct CompileHandle {
    shared: Arc<HandleShared>,
}

impl CompileHandle {
    /// Fresh unresolved handle for a job about to be dispatched.
    pub fn pending(method: MethodId, tier: Tier) -> Self {
        Self {
            shared: Arc::new(HandleShared {
                method,
                tier,
                state: Mutex::new(HandleState::Pending),
                resolved: Condvar::new(),
            }),
        }
    }

    pub fn method(&self) -> MethodId {
        self.shared.method
    }

    pub fn tier(&self) -> Tier {
        self.shared.tier
    }

    /// Non-blocking state check. This is the default access mode; the
    /// synchronizer and the per-thread fold treat `Pending` the same as
    /// absent.
    pub fn poll(&self) -> HandlePoll {
        match &*self.shared.state.lock() {
            HandleState::Pending => HandlePoll::Pending,
            HandleState::Ready(artifact) => HandlePoll::Ready(Arc::clone(artifact)),
            HandleState::Failed(err) => HandlePoll::Failed(err.clone()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.poll().is_pending()
    }

    /// Block until the job resolves. Only call this when a resolved value is
    /// required for correctness; ordinary lookups must use `poll`.
    pub fn wait(&self) -> Result<Arc<CompiledArtifact>, CompileError> {
        let mut state = self.shared.state.lock();
        loop {
            match &*state {
                HandleState::Ready(artifact) => return Ok(Arc::clone(artifact)),
                HandleState::Failed(err) => return Err(err.clone()),
                HandleState::Pending => {}
            }
            self.shared.resolved.wait(&mut state);
        }
    }

    /// Resolve the handle. First resolution wins; later calls are no-ops.
    pub(crate) fn fulfill(&self, outcome: Result<CompiledArtifact, CompileError>) {
        let mut state = self.shared.state.lock();
        if matches!(*state, HandleState::Pending) {
            *state = match outcome {
                Ok(artifact) => HandleState::Ready(Arc::new(artifact)),
                Err(err) => HandleState::Failed(err),
            };
            drop(state);
            self.shared.resolved.notify_all();
        }
    }
}
