//! Engine doubles shared by the unit tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jit_core::{
    CompilationEngine, CompileError, CompiledArtifact, ExecutionEngine, ExecutionResult, MethodId,
    Tier,
};

/// Result tags so tests can tell which path produced a value.
pub const INTERPRETED: u64 = 1 << 62;
pub const EXECUTED_L1: u64 = 1 << 61;
pub const EXECUTED_L2: u64 = 1 << 60;

pub fn interpreted(method: MethodId) -> ExecutionResult {
    ExecutionResult(INTERPRETED | method.0)
}

pub fn executed(method: MethodId, tier: Tier) -> ExecutionResult {
    let tag = match tier {
        Tier::L1 => EXECUTED_L1,
        Tier::L2 => EXECUTED_L2,
    };
    ExecutionResult(tag | method.0)
}

/// Executor double whose results encode the path taken and the method id.
pub struct TaggedExecutor;

impl ExecutionEngine for TaggedExecutor {
    fn execute(&self, artifact: &CompiledArtifact) -> ExecutionResult {
        executed(artifact.method, artifact.tier)
    }

    fn interpret(&self, method: MethodId) -> ExecutionResult {
        interpreted(method)
    }
}

/// Compiler double that counts invocations per tier and can be slowed down
/// or made to fail.
pub struct CountingCompiler {
    pub l1_calls: AtomicU64,
    pub l2_calls: AtomicU64,
    delay: Duration,
    fail: bool,
}

impl CountingCompiler {
    pub fn instant() -> Self {
        Self {
            l1_calls: AtomicU64::new(0),
            l2_calls: AtomicU64::new(0),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::instant()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::instant()
        }
    }

    pub fn calls(&self, tier: Tier) -> u64 {
        match tier {
            Tier::L1 => self.l1_calls.load(Ordering::SeqCst),
            Tier::L2 => self.l2_calls.load(Ordering::SeqCst),
        }
    }

    fn run(&self, method: MethodId, tier: Tier) -> Result<CompiledArtifact, CompileError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            return Err(CompileError::Failed {
                method,
                tier,
                reason: "test compiler configured to fail".into(),
            });
        }
        Ok(CompiledArtifact::new(method, tier, vec![tier as u8; 4]))
    }
}

impl CompilationEngine for CountingCompiler {
    fn compile_l1(&self, method: MethodId) -> Result<CompiledArtifact, CompileError> {
        self.l1_calls.fetch_add(1, Ordering::SeqCst);
        self.run(method, Tier::L1)
    }

    fn compile_l2(&self, method: MethodId) -> Result<CompiledArtifact, CompileError> {
        self.l2_calls.fetch_add(1, Ordering::SeqCst);
        self.run(method, Tier::L2)
    }
}
