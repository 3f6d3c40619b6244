//! Interfaces between the search and learned models.
//!
//! The search only needs two things from a model: per-action values for an
//! encoded state, and a way to encode a snapshot. Both are traits so tests
//! and hosts can plug in fixed or external models.

use crate::core::PlayerId;
use crate::state::StateSnapshot;

/// A Q-function approximator: encoded state in, one value per action out.
pub trait ActionValueModel {
    /// Predict per-action values.
    ///
    /// Must return exactly `output_size()` values, whatever the input.
    fn predict(&self, input: &[f32]) -> Vec<f32>;

    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    /// Batch prediction (optional optimization).
    fn predict_batch(&self, inputs: &[Vec<f32>]) -> Vec<Vec<f32>> {
        inputs.iter().map(|x| self.predict(x)).collect()
    }
}

/// Encodes snapshots into flat model inputs.
pub trait StateEncoder {
    /// Encode `state` from `perspective`'s point of view.
    fn encode(&self, state: &StateSnapshot, perspective: PlayerId) -> Vec<f32>;

    /// Length of every encoded vector.
    fn input_size(&self) -> usize;

    /// Number of action values the paired model outputs.
    fn action_space_size(&self) -> usize;
}

/// Model that returns the same values for every state.
///
/// Useful as a baseline and for steering the search in tests.
#[derive(Clone, Debug, Default)]
pub struct ConstantModel {
    values: Vec<f32>,
    input_size: usize,
}

impl ConstantModel {
    pub fn new(values: Vec<f32>, input_size: usize) -> Self {
        Self { values, input_size }
    }

    /// All-zero values.
    pub fn zeros(output_size: usize, input_size: usize) -> Self {
        Self::new(vec![0.0; output_size], input_size)
    }
}

impl ActionValueModel for ConstantModel {
    fn predict(&self, _input: &[f32]) -> Vec<f32> {
        self.values.clone()
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.values.len()
    }
}
