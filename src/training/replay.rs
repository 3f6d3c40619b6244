//! Bounded replay memory for off-policy training.
//!
//! FIFO: when full, the oldest experience is dropped before a new one is
//! appended, so the buffer always holds the most recent `capacity` entries
//! in insertion order.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::actions::action_name;
use crate::core::GameRng;
use crate::error::ExportError;

/// One transition: encoded state, action index, reward, next state, terminal flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
}

impl Experience {
    pub fn new(state: Vec<f32>, action: usize, reward: f32, next_state: Vec<f32>, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Snapshot of buffer statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub size: usize,
    pub capacity: usize,
    pub total_added: u64,
    /// Over stored entries.
    pub average_reward: f32,
    pub min_reward: f32,
    pub max_reward: f32,
    /// Stored entries per action index.
    pub action_distribution: Vec<(usize, usize)>,
}

/// Fixed-capacity experience store with uniform sampling.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    entries: VecDeque<Experience>,
    capacity: usize,
    total_added: u64,
    total_reward: f64,
    action_counts: FxHashMap<usize, u64>,
}

impl ReplayBuffer {
    /// Create an empty buffer. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            total_added: 0,
            total_reward: 0.0,
            action_counts: FxHashMap::default(),
        }
    }

    /// Append an experience, evicting the oldest when full.
    pub fn add(&mut self, experience: Experience) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.total_added += 1;
        self.total_reward += f64::from(experience.reward);
        *self.action_counts.entry(experience.action).or_insert(0) += 1;
        self.entries.push_back(experience);
    }

    /// Uniform sample with replacement.
    ///
    /// Returns `min(batch_size, size())` experiences; empty when the buffer is.
    pub fn sample(&self, batch_size: usize, rng: &mut GameRng) -> Vec<Experience> {
        let n = batch_size.min(self.entries.len());
        if n == 0 {
            return Vec::new();
        }
        (0..n)
            .map(|_| self.entries[rng.gen_range_usize(0..self.entries.len())].clone())
            .collect()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Experiences ever added, evicted ones included.
    #[must_use]
    pub fn total_added(&self) -> u64 {
        self.total_added
    }

    /// Mean reward over everything ever added.
    #[must_use]
    pub fn lifetime_average_reward(&self) -> f32 {
        if self.total_added == 0 {
            0.0
        } else {
            (self.total_reward / self.total_added as f64) as f32
        }
    }

    /// Lifetime count of experiences per action index.
    #[must_use]
    pub fn lifetime_action_counts(&self) -> Vec<(usize, u64)> {
        let mut counts: Vec<_> = self.action_counts.iter().map(|(a, c)| (*a, *c)).collect();
        counts.sort_unstable();
        counts
    }

    /// Stored experiences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.entries.iter()
    }

    /// Drop every stored experience and reset the running stats.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_added = 0;
        self.total_reward = 0.0;
        self.action_counts.clear();
    }

    /// Stored entries per action index, sorted by index.
    #[must_use]
    pub fn action_distribution(&self) -> Vec<(usize, usize)> {
        let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
        for e in &self.entries {
            *counts.entry(e.action).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_unstable();
        counts
    }

    #[must_use]
    pub fn stats(&self) -> ReplayStats {
        let mut stats = ReplayStats {
            size: self.entries.len(),
            capacity: self.capacity,
            total_added: self.total_added,
            action_distribution: self.action_distribution(),
            ..ReplayStats::default()
        };
        if self.entries.is_empty() {
            return stats;
        }

        let (min, max, sum) = self.entries.iter().fold(
            (f32::MAX, f32::MIN, 0.0_f64),
            |(lo, hi, s), e| (lo.min(e.reward), hi.max(e.reward), s + f64::from(e.reward)),
        );
        stats.min_reward = min;
        stats.max_reward = max;
        stats.average_reward = (sum / self.entries.len() as f64) as f32;
        stats
    }

    /// Write the most recent `n` experiences as CSV.
    pub fn export_sample_csv(&self, path: &Path, n: usize) -> Result<(), ExportError> {
        let mut out = String::from("Action,Reward,Done,StateSize,NextStateSize\n");
        let skip = self.entries.len().saturating_sub(n);
        for e in self.entries.iter().skip(skip) {
            let name = action_name(e.action)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Action{}", e.action));
            // Writing to a String cannot fail.
            let _ = writeln!(
                out,
                "{},{:.4},{},{},{}",
                name,
                e.reward,
                e.done,
                e.state.len(),
                e.next_state.len()
            );
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, out)?;
        Ok(())
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}
