//! Learning-side integration tests: replay memory, value network, Q-learner.

use proptest::prelude::*;
use tempfile::TempDir;

use tactics_ai::core::{GameRng, LearningConfig};
use tactics_ai::error::ModelError;
use tactics_ai::nn::{ActionValueModel, ValueNetwork};
use tactics_ai::training::{Experience, QLearner, ReplayBuffer, TrainingMetrics};

fn tagged(tag: f32) -> Experience {
    Experience::new(vec![tag], 1, tag, vec![tag], false)
}

// =============================================================================
// Replay Buffer
// =============================================================================

proptest! {
    #[test]
    fn prop_replay_keeps_last_capacity_in_order(capacity in 1usize..32, extra in 1usize..32) {
        let mut buffer = ReplayBuffer::new(capacity);
        let total = capacity + extra;
        for i in 0..total {
            buffer.add(tagged(i as f32));
        }

        prop_assert_eq!(buffer.size(), capacity);
        prop_assert_eq!(buffer.total_added(), total as u64);

        let kept: Vec<f32> = buffer.iter().map(|e| e.reward).collect();
        let expected: Vec<f32> = (extra..total).map(|i| i as f32).collect();
        prop_assert_eq!(kept, expected);
        prop_assert!(buffer.iter().all(|e| e.reward != 0.0));
    }

    #[test]
    fn prop_sample_size_is_clamped(size in 0usize..20, batch in 0usize..40, seed in any::<u64>()) {
        let mut buffer = ReplayBuffer::new(16);
        for i in 0..size {
            buffer.add(tagged(i as f32));
        }
        let mut rng = GameRng::new(seed);
        let sample = buffer.sample(batch, &mut rng);
        prop_assert_eq!(sample.len(), batch.min(buffer.size()));
    }
}

#[test]
fn test_capacity_two_only_samples_last_two() {
    let mut buffer = ReplayBuffer::new(2);
    buffer.add(tagged(1.0));
    buffer.add(tagged(2.0));
    buffer.add(tagged(3.0));

    let mut rng = GameRng::new(11);
    for _ in 0..200 {
        for experience in buffer.sample(2, &mut rng) {
            assert!(experience.reward == 2.0 || experience.reward == 3.0);
        }
    }
}

#[test]
fn test_sampling_reaches_every_entry() {
    let mut buffer = ReplayBuffer::new(4);
    for i in 0..4 {
        buffer.add(tagged(i as f32));
    }

    let mut rng = GameRng::new(3);
    let mut seen = [false; 4];
    for experience in buffer.sample(400, &mut rng) {
        seen[experience.reward as usize] = true;
    }
    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_replay_sample_csv_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("experiences.csv");

    let mut buffer = ReplayBuffer::new(8);
    buffer.add(Experience::new(vec![0.0; 3], 2, 1.5, vec![0.0; 3], false));
    buffer.add(Experience::new(vec![0.0; 3], 4, -0.25, vec![0.0; 3], true));
    buffer.export_sample_csv(&path, 1).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Action,Reward,Done,StateSize,NextStateSize");
    assert_eq!(lines[1], "SpawnUnit,-0.2500,true,3,3");
    assert_eq!(lines.len(), 2);
}

// =============================================================================
// Value Network
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_network_shapes_never_change(
        input in proptest::collection::vec(-1.0f32..1.0, 0..12),
        target in proptest::collection::vec(-5.0f32..5.0, 0..6),
        seed in any::<u64>(),
    ) {
        let mut network = ValueNetwork::with_seed(6, 5, 3, seed);

        prop_assert_eq!(network.predict(&input).len(), 3);
        let _ = network.train(&input, &target, 0.01);

        prop_assert_eq!(network.input_size(), 6);
        prop_assert_eq!(network.hidden_size(), 5);
        prop_assert_eq!(network.output_size(), 3);
        prop_assert_eq!(network.predict(&input).len(), 3);
    }
}

#[test]
fn test_repeated_training_never_increases_loss() {
    let mut network = ValueNetwork::with_seed(4, 8, 3, 21);
    let input = [0.5, -0.25, 1.0, 0.75];
    let target = [1.0, -1.0, 0.5];

    let losses: Vec<f32> = (0..60)
        .map(|_| network.train(&input, &target, 0.005).loss)
        .collect();

    for pair in losses.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-6, "loss went up: {} -> {}", pair[0], pair[1]);
    }
    assert!(losses[59] < losses[0]);
    assert_eq!(network.training_steps(), 60);
}

#[test]
fn test_save_and_load_preserve_predictions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");

    let mut network = ValueNetwork::with_seed(5, 6, 6, 2);
    network.train(&[0.1, 0.2, 0.3, 0.4, 0.5], &[1.0; 6], 0.01);
    let backup = network.save(&path).unwrap();

    assert!(backup.ends_with("model_v1.json"));
    assert!(backup.exists());

    let loaded = ValueNetwork::load(&path).unwrap();
    let input = [0.5, 0.4, 0.3, 0.2, 0.1];
    assert_eq!(loaded.predict(&input), network.predict(&input));
    assert_eq!(loaded.training_steps(), 1);
}

#[test]
fn test_load_missing_model_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = ValueNetwork::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(ModelError::NotFound(_))));
}

// =============================================================================
// Q-Learner
// =============================================================================

#[test]
fn test_learner_trains_once_buffer_exceeds_batch() {
    let config = LearningConfig::default()
        .with_batch_size(4)
        .with_exploration(0.5);
    let network = ValueNetwork::with_seed(2, 4, 6, 1);
    let mut learner = QLearner::new(network, config);
    let mut metrics = TrainingMetrics::with_session_id("test");

    for i in 0..4 {
        let exp = Experience::new(vec![0.1, i as f32], 2, 1.0, vec![0.2, i as f32], false);
        assert!(learner.record(exp, Some(&mut metrics)).is_none());
    }
    assert_eq!(learner.network().training_steps(), 0);

    let exp = Experience::new(vec![0.3, 0.3], 2, 1.0, vec![0.0, 0.0], true);
    let summary = learner.record(exp, Some(&mut metrics)).unwrap();

    assert_eq!(summary.batch, 4);
    assert_eq!(learner.network().training_steps(), 4);
    assert_eq!(metrics.losses.len(), 4);
    assert!((learner.exploration() - 0.5 * 0.999).abs() < 1e-12);
}

#[test]
fn test_learner_pulls_terminal_value_towards_reward() {
    let config = LearningConfig::default().with_batch_size(1);
    let network = ValueNetwork::with_seed(2, 8, 6, 5);
    let mut learner = QLearner::new(network, config);

    let state = vec![1.0, 0.5];
    let start = learner.network().predict(&state)[3];
    for _ in 0..200 {
        learner.record(Experience::new(state.clone(), 3, 10.0, state.clone(), true), None);
    }
    let end = learner.network().predict(&state)[3];

    assert!((10.0 - end).abs() < (10.0 - start).abs());
}

#[test]
fn test_exploration_decays_to_floor() {
    let config = LearningConfig::default().with_batch_size(1).with_exploration(0.06);
    let mut learner = QLearner::new(ValueNetwork::with_seed(1, 2, 6, 0), config);
    learner.record(tagged(0.0), None);

    for _ in 0..500 {
        learner.learn(None);
    }
    assert!((learner.exploration() - 0.05).abs() < 1e-12);
}
