//! Construction-time configuration for the cache.

use serde::{Deserialize, Serialize};

/// Tuning knobs fixed at cache construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Number of compilation worker threads in the dispatcher pool.
    pub compilation_thread_bound: usize,
    /// Invocation count a method must exceed before L1 compilation.
    pub l1_threshold: u64,
    /// Invocation count a method must exceed before L2 compilation.
    pub l2_threshold: u64,
    /// Sleep between synchronizer promotion cycles (microseconds).
    pub sync_interval_us: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            compilation_thread_bound: num_cpus::get().max(1),
            l1_threshold: 1_000,
            l2_threshold: 10_000,
            sync_interval_us: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = CacheConfig::default();
        assert_eq!(config.l1_threshold, 1_000);
        assert_eq!(config.l2_threshold, 10_000);
        assert!(config.compilation_thread_bound >= 1);
    }
}
