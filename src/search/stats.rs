//! Search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one `select_best_plan` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes visited, root included.
    pub nodes: u64,

    /// Leaf evaluations requested (cache hits included).
    pub leaf_evals: u64,

    /// Leaf evaluations answered from the cache.
    pub cache_hits: u64,

    /// Sibling cut-offs taken by alpha-beta.
    pub prunes: u64,

    /// Candidate plans considered at the root.
    pub root_plans: usize,

    /// Deepest ply reached below the root.
    pub max_depth: u32,

    /// A node or time budget stopped expansion early.
    pub budget_exhausted: bool,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn nodes_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.nodes as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Fraction of leaf evaluations served by the cache.
    #[must_use]
    pub fn cache_hit_rate(&self) -> f64 {
        if self.leaf_evals == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.leaf_evals as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = SearchStats::new();
        assert_eq!(stats.nodes, 0);
        assert!(!stats.budget_exhausted);
        assert_eq!(stats.nodes_per_second(), 0.0);
    }

    #[test]
    fn test_rates() {
        let mut stats = SearchStats::new();
        stats.nodes = 1000;
        stats.time_us = 500_000;
        stats.leaf_evals = 10;
        stats.cache_hits = 4;

        assert!((stats.nodes_per_second() - 2000.0).abs() < 1e-9);
        assert!((stats.cache_hit_rate() - 0.4).abs() < 1e-12);

        stats.reset();
        assert_eq!(stats, SearchStats::default());
    }
}
