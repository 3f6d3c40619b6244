//! Online Q-learning over a replay buffer.

use tracing::debug;

use crate::core::{GameRng, LearningConfig};
use crate::nn::ValueNetwork;

use super::metrics::TrainingMetrics;
use super::replay::{Experience, ReplayBuffer};

/// Averages over one learning batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LearnSummary {
    pub batch: usize,
    pub average_loss: f32,
    pub average_td_error: f32,
}

/// Owns the network, its replay memory, and the exploration rate.
#[derive(Clone, Debug)]
pub struct QLearner {
    network: ValueNetwork,
    buffer: ReplayBuffer,
    exploration: f64,
    config: LearningConfig,
    rng: GameRng,
}

impl QLearner {
    pub fn new(network: ValueNetwork, config: LearningConfig) -> Self {
        let rng = GameRng::new(config.seed).for_context("replay");
        Self {
            network,
            buffer: ReplayBuffer::new(config.replay_capacity),
            exploration: config.exploration_rate,
            config,
            rng,
        }
    }

    #[must_use]
    pub fn network(&self) -> &ValueNetwork {
        &self.network
    }

    /// Swap in another network (e.g. one loaded from disk). Replay memory is kept.
    pub fn replace_network(&mut self, network: ValueNetwork) {
        self.network = network;
    }

    #[must_use]
    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    #[must_use]
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Draw whether to explore this turn.
    pub fn should_explore(&mut self) -> bool {
        self.rng.gen_bool(self.exploration)
    }

    /// Store a transition and learn once the buffer holds more than a batch.
    pub fn record(
        &mut self,
        experience: Experience,
        metrics: Option<&mut TrainingMetrics>,
    ) -> Option<LearnSummary> {
        self.buffer.add(experience);
        if self.buffer.size() > self.config.batch_size {
            Some(self.learn(metrics))
        } else {
            None
        }
    }

    /// One pass over a sampled batch, then decay exploration.
    ///
    /// For each sample the target is the current prediction with the taken
    /// action replaced by `r` (terminal) or `r + gamma * max(next_q)`.
    pub fn learn(&mut self, mut metrics: Option<&mut TrainingMetrics>) -> LearnSummary {
        let batch = self.buffer.sample(self.config.batch_size, &mut self.rng);
        let mut total_loss = 0.0;
        let mut total_td = 0.0;
        let mut trained = 0;

        for experience in &batch {
            let mut target = self.network.predict(&experience.state);
            let Some(slot) = target.get_mut(experience.action) else {
                continue;
            };
            *slot = if experience.done {
                experience.reward
            } else {
                let next = self.network.predict(&experience.next_state);
                let best = next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let best = if best.is_finite() { best } else { 0.0 };
                experience.reward + self.config.discount * best
            };

            let result = self
                .network
                .train(&experience.state, &target, self.config.learning_rate);
            total_loss += result.loss;
            total_td += result.max_abs_td;
            trained += 1;

            if let Some(m) = metrics.as_deref_mut() {
                m.record_training_step(result.loss, result.max_abs_td, &result.q_values);
            }
        }

        self.exploration =
            (self.exploration * self.config.exploration_decay).max(self.config.min_exploration);

        let summary = if trained == 0 {
            LearnSummary::default()
        } else {
            LearnSummary {
                batch: trained,
                average_loss: total_loss / trained as f32,
                average_td_error: total_td / trained as f32,
            }
        };
        debug!(
            batch = summary.batch,
            loss = summary.average_loss,
            td_error = summary.average_td_error,
            exploration = self.exploration,
            "training batch"
        );
        summary
    }
}
