//! Thread-confined artifact cache.
//!
//! Each execution thread owns one `LocalCache` with one map per tier.
//! Entries arrive only by folding completed global handles in, and are
//! never removed: once a tier is resident it stays resident for the life
//! of the thread. L2 supersedes L1 for lookups but does not displace it.

use std::collections::HashMap;
use std::sync::Arc;

use jit_core::{CompiledArtifact, MethodId, Tier};

/// Outcome of a local lookup, mirroring which tier (if any) was resident.
#[derive(Debug, Clone)]
pub enum LocalLookup {
    Empty,
    L1(Arc<CompiledArtifact>),
    L2(Arc<CompiledArtifact>),
}

impl LocalLookup {
    pub fn is_empty(&self) -> bool {
        matches!(self, LocalLookup::Empty)
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            LocalLookup::Empty => None,
            LocalLookup::L1(_) => Some(Tier::L1),
            LocalLookup::L2(_) => Some(Tier::L2),
        }
    }

    pub fn artifact(&self) -> Option<&Arc<CompiledArtifact>> {
        match self {
            LocalLookup::Empty => None,
            LocalLookup::L1(artifact) | LocalLookup::L2(artifact) => Some(artifact),
        }
    }
}

/// Unsynchronized per-thread tier maps. Purely additive.
#[derive(Debug, Default)]
pub struct LocalCache {
    l1: HashMap<MethodId, Arc<CompiledArtifact>>,
    l2: HashMap<MethodId, Arc<CompiledArtifact>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn tier_map(&self, tier: Tier) -> &HashMap<MethodId, Arc<CompiledArtifact>> {
        match tier {
            Tier::L1 => &self.l1,
            Tier::L2 => &self.l2,
        }
    }

    /// Best resident artifact for `method`: L2 first, then L1.
    pub fn lookup(&self, method: MethodId) -> LocalLookup {
        if let Some(artifact) = self.l2.get(&method) {
            return LocalLookup::L2(Arc::clone(artifact));
        }
        if let Some(artifact) = self.l1.get(&method) {
            return LocalLookup::L1(Arc::clone(artifact));
        }
        LocalLookup::Empty
    }

    /// Insert a completed artifact. Idempotent: re-merging an already
    /// resident entry changes nothing and reports `false`.
    pub fn merge(&mut self, method: MethodId, tier: Tier, artifact: Arc<CompiledArtifact>) -> bool {
        let map = match tier {
            Tier::L1 => &mut self.l1,
            Tier::L2 => &mut self.l2,
        };
        if map.contains_key(&method) {
            return false;
        }
        map.insert(method, artifact);
        true
    }

    pub fn contains(&self, method: MethodId, tier: Tier) -> bool {
        self.tier_map(tier).contains_key(&method)
    }

    pub fn get(&self, method: MethodId, tier: Tier) -> Option<&Arc<CompiledArtifact>> {
        self.tier_map(tier).get(&method)
    }

    pub fn len(&self, tier: Tier) -> usize {
        self.tier_map(tier).len()
    }

    pub fn is_empty(&self) -> bool {
        self.l1.is_empty() && self.l2.is_empty()
    }
}
