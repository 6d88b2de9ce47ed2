//! Core types for the tiered JIT compilation cache.
//!
//! This crate defines the vocabulary shared between the cache and its host:
//! method identities, compilation tiers, compiled artifacts, and the two
//! capability traits (`ExecutionEngine`, `CompilationEngine`) the host must
//! provide. The cache itself lives in the `jit-cache` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a compilable unit ("method").
///
/// Equality, ordering and hashing derive structurally from the numeric id,
/// so two `MethodId` values naming the same method always compare equal no
/// matter where they came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MethodId(pub u64);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Optimization tier of a compiled artifact.
///
/// `L2` is strictly more optimized than `L1`; the derived ordering reflects
/// that. A method may have zero, one, or both tiers resident at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    L1,
    L2,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::L1 => write!(f, "L1"),
            Tier::L2 => write!(f, "L2"),
        }
    }
}

/// Immutable product of compiling a method at a given tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    /// Method this artifact was compiled from.
    pub method: MethodId,
    /// Tier the artifact was compiled at.
    pub tier: Tier,
    /// Generated code image (opaque to the cache).
    pub code: Vec<u8>,
}

impl CompiledArtifact {
    pub fn new(method: MethodId, tier: Tier, code: Vec<u8>) -> Self {
        Self { method, tier, code }
    }
}

/// Opaque result of running a method, whether interpreted or compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult(pub u64);

/// Compilation failure taxonomy.
///
/// Errors are `Clone` because a single failed compilation fans out to every
/// observer of the corresponding cache handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The compiler capability rejected or aborted the request.
    #[error("compilation of {method} at {tier} failed: {reason}")]
    Failed {
        method: MethodId,
        tier: Tier,
        reason: String,
    },
    /// The job was submitted after the worker pool shut down.
    #[error("compilation worker pool is shut down")]
    PoolShutdown,
}

/// Host capability that runs methods, either from a compiled artifact or by
/// direct interpretation of the method identity.
pub trait ExecutionEngine: Send + Sync {
    /// Run a previously compiled artifact.
    fn execute(&self, artifact: &CompiledArtifact) -> ExecutionResult;
    /// Interpret the method directly, without compiled code.
    fn interpret(&self, method: MethodId) -> ExecutionResult;
}

/// Host capability that compiles methods. Both tiers may fail.
pub trait CompilationEngine: Send + Sync {
    fn compile_l1(&self, method: MethodId) -> Result<CompiledArtifact, CompileError>;
    fn compile_l2(&self, method: MethodId) -> Result<CompiledArtifact, CompileError>;

    /// Compile at the requested tier.
    fn compile(&self, method: MethodId, tier: Tier) -> Result<CompiledArtifact, CompileError> {
        match tier {
            Tier::L1 => self.compile_l1(method),
            Tier::L2 => self.compile_l2(method),
        }
    }
}
