//! One-hidden-layer feed-forward Q-network with manual backpropagation.
//!
//! ```text
//! hidden = ReLU(W1 · x + b1)
//! output = W2 · hidden + b2
//! ```
//!
//! Weights are stored row-major (`W1` is hidden × input, `W2` is output ×
//! hidden), initialized Xavier-uniform from a seeded `GameRng`, biases zero.
//!
//! ## Example
//!
//! ```
//! use tactics_ai::nn::ValueNetwork;
//!
//! let mut net = ValueNetwork::with_seed(4, 8, 2, 42);
//! let x = [0.5, -0.25, 1.0, 0.0];
//! let target = [1.0, -1.0];
//!
//! let first = net.train(&x, &target, 0.01).loss;
//! let second = net.train(&x, &target, 0.01).loss;
//! assert!(second < first);
//! assert_eq!(net.predict(&[0.0; 3]), vec![0.0, 0.0]); // wrong size
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::core::GameRng;
use crate::error::ModelError;

use super::traits::ActionValueModel;

const RECENT_LOSS_WINDOW: usize = 100;

/// Outcome of one training step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainResult {
    /// Mean squared error before the update.
    pub loss: f32,
    /// Largest |target - output| before the update.
    pub max_abs_td: f32,
    /// Network output before the update.
    pub q_values: Vec<f32>,
}

/// Summary statistics over both weight matrices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    pub count: usize,
}

/// On-disk model format.
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    input_size: usize,
    output_size: usize,
    hidden_size: usize,
    weights1: Vec<Vec<f32>>,
    weights2: Vec<Vec<f32>>,
    bias1: Vec<f32>,
    bias2: Vec<f32>,
    #[serde(default)]
    training_steps: u64,
}

/// Small dense Q-network.
#[derive(Clone, Debug)]
pub struct ValueNetwork {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    weights1: Vec<f32>,
    weights2: Vec<f32>,
    bias1: Vec<f32>,
    bias2: Vec<f32>,
    training_steps: u64,
    total_loss: f64,
    recent_losses: VecDeque<f32>,
}

impl ValueNetwork {
    /// Xavier-uniform initialization drawing from `rng`.
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize, rng: &mut GameRng) -> Self {
        let weights1 = xavier(hidden_size * input_size, input_size, hidden_size, rng);
        let weights2 = xavier(output_size * hidden_size, hidden_size, output_size, rng);
        Self {
            input_size,
            hidden_size,
            output_size,
            weights1,
            weights2,
            bias1: vec![0.0; hidden_size],
            bias2: vec![0.0; output_size],
            training_steps: 0,
            total_loss: 0.0,
            recent_losses: VecDeque::with_capacity(RECENT_LOSS_WINDOW),
        }
    }

    /// Initialize from a seed.
    pub fn with_seed(input_size: usize, hidden_size: usize, output_size: usize, seed: u64) -> Self {
        let mut rng = GameRng::new(seed).for_context("weights");
        Self::new(input_size, hidden_size, output_size, &mut rng)
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    #[must_use]
    pub fn training_steps(&self) -> u64 {
        self.training_steps
    }

    /// Mean loss over every training step so far.
    #[must_use]
    pub fn average_loss(&self) -> f32 {
        if self.training_steps == 0 {
            0.0
        } else {
            (self.total_loss / self.training_steps as f64) as f32
        }
    }

    /// Mean loss over the last 100 steps.
    #[must_use]
    pub fn recent_average_loss(&self) -> f32 {
        if self.recent_losses.is_empty() {
            0.0
        } else {
            self.recent_losses.iter().sum::<f32>() / self.recent_losses.len() as f32
        }
    }

    /// Per-action values for `input`.
    ///
    /// A wrongly-sized input logs an error and yields zeros.
    #[must_use]
    pub fn predict(&self, input: &[f32]) -> Vec<f32> {
        if input.len() != self.input_size {
            error!(
                expected = self.input_size,
                found = input.len(),
                "value network input size mismatch"
            );
            return vec![0.0; self.output_size];
        }
        self.forward(input).2
    }

    /// Returns (hidden pre-activations, hidden activations, outputs).
    fn forward(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let pre: Vec<f32> = (0..self.hidden_size)
            .map(|i| {
                let row = &self.weights1[i * self.input_size..(i + 1) * self.input_size];
                dot(row, input) + self.bias1[i]
            })
            .collect();
        let hidden: Vec<f32> = pre.iter().map(|v| v.max(0.0)).collect();
        let output: Vec<f32> = (0..self.output_size)
            .map(|j| {
                let row = &self.weights2[j * self.hidden_size..(j + 1) * self.hidden_size];
                dot(row, &hidden) + self.bias2[j]
            })
            .collect();
        (pre, hidden, output)
    }

    /// One gradient step towards `target` on mean squared error.
    ///
    /// Shapes never change. Wrongly-sized arguments log an error and leave the
    /// weights untouched.
    pub fn train(&mut self, input: &[f32], target: &[f32], learning_rate: f32) -> TrainResult {
        if input.len() != self.input_size || target.len() != self.output_size {
            error!(
                input = input.len(),
                target = target.len(),
                expected_input = self.input_size,
                expected_output = self.output_size,
                "value network training size mismatch"
            );
            return TrainResult {
                q_values: vec![0.0; self.output_size],
                ..TrainResult::default()
            };
        }

        let (pre, hidden, output) = self.forward(input);

        let delta_out: Vec<f32> = target.iter().zip(&output).map(|(t, o)| t - o).collect();
        let loss = delta_out.iter().map(|d| d * d).sum::<f32>() / self.output_size.max(1) as f32;
        let max_abs_td = delta_out.iter().fold(0.0_f32, |m, d| m.max(d.abs()));

        // Hidden deltas use the weights before this step's update.
        let delta_hidden: Vec<f32> = (0..self.hidden_size)
            .map(|i| {
                if pre[i] <= 0.0 {
                    return 0.0;
                }
                (0..self.output_size)
                    .map(|j| delta_out[j] * self.weights2[j * self.hidden_size + i])
                    .sum()
            })
            .collect();

        for (j, d) in delta_out.iter().enumerate() {
            let row = &mut self.weights2[j * self.hidden_size..(j + 1) * self.hidden_size];
            for (w, h) in row.iter_mut().zip(&hidden) {
                *w += learning_rate * d * h;
            }
            self.bias2[j] += learning_rate * d;
        }

        for (i, d) in delta_hidden.iter().enumerate() {
            if *d == 0.0 {
                continue;
            }
            let row = &mut self.weights1[i * self.input_size..(i + 1) * self.input_size];
            for (w, x) in row.iter_mut().zip(input) {
                *w += learning_rate * d * x;
            }
            self.bias1[i] += learning_rate * d;
        }

        self.training_steps += 1;
        self.total_loss += f64::from(loss);
        if self.recent_losses.len() == RECENT_LOSS_WINDOW {
            self.recent_losses.pop_front();
        }
        self.recent_losses.push_back(loss);

        TrainResult {
            loss,
            max_abs_td,
            q_values: output,
        }
    }

    /// Statistics over all entries of both weight matrices.
    #[must_use]
    pub fn weight_stats(&self) -> WeightStats {
        let all = || self.weights1.iter().chain(&self.weights2).copied();
        let count = self.weights1.len() + self.weights2.len();
        if count == 0 {
            return WeightStats::default();
        }

        let (min, max, sum) = all().fold((f32::MAX, f32::MIN, 0.0_f64), |(lo, hi, s), w| {
            (lo.min(w), hi.max(w), s + f64::from(w))
        });
        let mean = sum / count as f64;
        let variance = all().map(|w| (f64::from(w) - mean).powi(2)).sum::<f64>() / count as f64;

        WeightStats {
            min,
            max,
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
            count,
        }
    }

    /// Write the model to `path` and a versioned backup next to it.
    ///
    /// Returns the backup path (`<stem>_v<steps>.json`).
    pub fn save(&self, path: &Path) -> Result<PathBuf, ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = ModelFile {
            input_size: self.input_size,
            output_size: self.output_size,
            hidden_size: self.hidden_size,
            weights1: rows(&self.weights1, self.input_size),
            weights2: rows(&self.weights2, self.hidden_size),
            bias1: self.bias1.clone(),
            bias2: self.bias2.clone(),
            training_steps: self.training_steps,
        };
        let json = serde_json::to_string(&file)?;
        fs::write(path, &json)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let backup = path.with_file_name(format!("{}_v{}.json", stem, self.training_steps));
        fs::write(&backup, &json)?;

        debug!(path = %path.display(), steps = self.training_steps, "saved value network");
        Ok(backup)
    }

    /// Load a model written by `save`.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        let file: ModelFile = serde_json::from_str(&json)?;

        check("weights1", file.hidden_size, file.weights1.len())?;
        check("weights2", file.output_size, file.weights2.len())?;
        check("bias1", file.hidden_size, file.bias1.len())?;
        check("bias2", file.output_size, file.bias2.len())?;
        for row in &file.weights1 {
            check("weights1 row", file.input_size, row.len())?;
        }
        for row in &file.weights2 {
            check("weights2 row", file.hidden_size, row.len())?;
        }

        debug!(path = %path.display(), steps = file.training_steps, "loaded value network");
        Ok(Self {
            input_size: file.input_size,
            hidden_size: file.hidden_size,
            output_size: file.output_size,
            weights1: file.weights1.concat(),
            weights2: file.weights2.concat(),
            bias1: file.bias1,
            bias2: file.bias2,
            training_steps: file.training_steps,
            total_loss: 0.0,
            recent_losses: VecDeque::with_capacity(RECENT_LOSS_WINDOW),
        })
    }
}

impl ActionValueModel for ValueNetwork {
    fn predict(&self, input: &[f32]) -> Vec<f32> {
        ValueNetwork::predict(self, input)
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

fn xavier(len: usize, fan_in: usize, fan_out: usize, rng: &mut GameRng) -> Vec<f32> {
    let fan = (fan_in + fan_out).max(1) as f64;
    let limit = (6.0 / fan).sqrt();
    (0..len)
        .map(|_| rng.gen_range_f64(-limit..limit) as f32)
        .collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn rows(flat: &[f32], width: usize) -> Vec<Vec<f32>> {
    if width == 0 {
        return Vec::new();
    }
    flat.chunks(width).map(<[f32]>::to_vec).collect()
}

fn check(field: &'static str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected == found {
        Ok(())
    } else {
        Err(ModelError::Shape {
            field,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let net = ValueNetwork::with_seed(10, 16, 6, 1);
        assert_eq!(net.predict(&[0.1; 10]).len(), 6);
        assert_eq!(net.predict(&[0.1; 3]).len(), 6);
        assert_eq!(net.predict(&[]).len(), 6);
    }

    #[test]
    fn test_xavier_bounds_and_zero_biases() {
        let net = ValueNetwork::with_seed(10, 20, 4, 3);
        let limit1 = (6.0_f32 / 30.0).sqrt();
        let limit2 = (6.0_f32 / 24.0).sqrt();
        assert!(net.weights1.iter().all(|w| w.abs() <= limit1));
        assert!(net.weights2.iter().all(|w| w.abs() <= limit2));
        assert!(net.bias1.iter().all(|b| *b == 0.0));
        assert!(net.bias2.iter().all(|b| *b == 0.0));
    }

    #[test]
    fn test_seeded_init_is_deterministic() {
        let a = ValueNetwork::with_seed(5, 7, 3, 11);
        let b = ValueNetwork::with_seed(5, 7, 3, 11);
        assert_eq!(a.weights1, b.weights1);
        assert_eq!(a.weights2, b.weights2);
    }

    #[test]
    fn test_loss_decreases_on_repeated_pair() {
        let mut net = ValueNetwork::with_seed(6, 12, 3, 5);
        let x = [0.2, -0.4, 0.9, 0.0, 0.5, -0.1];
        let target = [1.0, 0.0, -0.5];

        let mut previous = f32::INFINITY;
        for _ in 0..200 {
            let result = net.train(&x, &target, 0.01);
            assert!(result.loss <= previous + 1e-6);
            previous = result.loss;
        }
        assert!(previous < 0.05);
        assert_eq!(net.training_steps(), 200);
    }

    #[test]
    fn test_train_reports_td_error() {
        let mut net = ValueNetwork::with_seed(2, 4, 2, 9);
        let x = [1.0, 1.0];
        let q = net.predict(&x);
        let result = net.train(&x, &[q[0] + 2.0, q[1]], 0.0);

        assert!((result.max_abs_td - 2.0).abs() < 1e-5);
        assert!((result.loss - 2.0).abs() < 1e-4);
        assert_eq!(result.q_values, q);
    }

    #[test]
    fn test_wrong_size_train_is_noop() {
        let mut net = ValueNetwork::with_seed(3, 4, 2, 9);
        let before = net.clone();
        let result = net.train(&[1.0], &[0.0, 0.0], 0.1);

        assert_eq!(result.loss, 0.0);
        assert_eq!(net.weights1, before.weights1);
        assert_eq!(net.training_steps(), 0);
        assert_eq!(net.input_size(), 3);
        assert_eq!(net.output_size(), 2);
        assert_eq!(net.hidden_size(), 4);
    }

    #[test]
    fn test_loss_averages() {
        let mut net = ValueNetwork::with_seed(2, 3, 1, 2);
        assert_eq!(net.average_loss(), 0.0);
        for _ in 0..150 {
            net.train(&[0.5, 0.5], &[1.0], 0.001);
        }
        assert_eq!(net.recent_losses.len(), RECENT_LOSS_WINDOW);
        assert!(net.average_loss() > 0.0);
        assert!(net.recent_average_loss() <= net.average_loss() + 1e-6);
    }

    #[test]
    fn test_weight_stats() {
        let net = ValueNetwork::with_seed(4, 5, 2, 8);
        let stats = net.weight_stats();
        assert_eq!(stats.count, 4 * 5 + 5 * 2);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert!(stats.std_dev > 0.0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut net = ValueNetwork::with_seed(5, 6, 3, 21);
        net.train(&[0.1, 0.2, 0.3, 0.4, 0.5], &[1.0, 0.0, 0.0], 0.05);

        let backup = net.save(&path).unwrap();
        assert_eq!(backup, dir.path().join("model_v1.json"));
        assert!(backup.exists());

        let loaded = ValueNetwork::load(&path).unwrap();
        assert_eq!(loaded.input_size(), 5);
        assert_eq!(loaded.hidden_size(), 6);
        assert_eq!(loaded.output_size(), 3);
        assert_eq!(loaded.training_steps(), 1);
        for (a, b) in net.weights1.iter().zip(&loaded.weights1) {
            assert!((a - b).abs() < 1e-6);
        }
        let x = [0.3, 0.1, 0.0, 0.9, 0.2];
        for (a, b) in net.predict(&x).iter().zip(loaded.predict(&x)) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ValueNetwork::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_bad_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"input_size":2,"output_size":1,"hidden_size":2,
                "weights1":[[0.1,0.2],[0.3]],"weights2":[[0.5,0.5]],
                "bias1":[0.0,0.0],"bias2":[0.0]}"#,
        )
        .unwrap();

        let err = ValueNetwork::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Shape { field: "weights1 row", .. }));
    }
}
