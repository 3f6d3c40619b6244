//! Training telemetry and its CSV/JSON exports.
//!
//! Every `save_csv` call appends only the rows recorded since the previous
//! call, so a long session can export periodically without duplicating rows.
//! Headers are written when a file is first created.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::actions::action_name;
use crate::error::ExportError;
use crate::nn::WeightStats;

/// Per-turn strategic snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategicSample {
    /// Objective-control turns held by the agent.
    pub objective_control: u32,
    /// Own minus enemy unit count.
    pub unit_count_diff: i32,
    /// Own minus enemy resources.
    pub resource_diff: i64,
    /// Structures captured so far this game.
    pub structures_captured: u32,
}

/// Rows already written by `save_csv`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ExportCursor {
    episodes: usize,
    steps: usize,
    games: usize,
    strategic: usize,
}

/// Everything recorded during a training session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub session_id: String,
    pub episode_rewards: Vec<f32>,
    pub cumulative_rewards: Vec<f32>,
    pub exploration_rates: Vec<f64>,
    pub losses: Vec<f32>,
    pub td_errors: Vec<f32>,
    pub mean_q_values: Vec<f32>,
    pub game_wins: Vec<bool>,
    pub game_lengths: Vec<u32>,
    pub action_counts: BTreeMap<usize, u64>,
    pub action_rewards: BTreeMap<usize, f64>,
    pub strategic: Vec<StrategicSample>,
    #[serde(skip)]
    cursor: ExportCursor,
}

impl TrainingMetrics {
    /// Start a session named after the current unix time.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::with_session_id(format!("session_{secs}"))
    }

    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            episode_rewards: Vec::new(),
            cumulative_rewards: Vec::new(),
            exploration_rates: Vec::new(),
            losses: Vec::new(),
            td_errors: Vec::new(),
            mean_q_values: Vec::new(),
            game_wins: Vec::new(),
            game_lengths: Vec::new(),
            action_counts: BTreeMap::new(),
            action_rewards: BTreeMap::new(),
            strategic: Vec::new(),
            cursor: ExportCursor::default(),
        }
    }

    /// One turn of play: its reward, the running total, and current ε.
    pub fn record_episode(&mut self, reward: f32, cumulative: f32, exploration: f64) {
        self.episode_rewards.push(reward);
        self.cumulative_rewards.push(cumulative);
        self.exploration_rates.push(exploration);
    }

    /// One network update.
    pub fn record_training_step(&mut self, loss: f32, td_error: f32, q_values: &[f32]) {
        let mean_q = if q_values.is_empty() {
            0.0
        } else {
            q_values.iter().sum::<f32>() / q_values.len() as f32
        };
        self.losses.push(loss);
        self.td_errors.push(td_error);
        self.mean_q_values.push(mean_q);
    }

    pub fn record_action(&mut self, action: usize, reward: f32) {
        *self.action_counts.entry(action).or_insert(0) += 1;
        *self.action_rewards.entry(action).or_insert(0.0) += f64::from(reward);
    }

    pub fn record_game(&mut self, won: bool, turns: u32) {
        self.game_wins.push(won);
        self.game_lengths.push(turns);
    }

    pub fn record_strategic(&mut self, sample: StrategicSample) {
        self.strategic.push(sample);
    }

    #[must_use]
    pub fn games_played(&self) -> usize {
        self.game_wins.len()
    }

    #[must_use]
    pub fn wins(&self) -> usize {
        self.game_wins.iter().filter(|w| **w).count()
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.games_played() {
            0 => 0.0,
            n => self.wins() as f64 / n as f64,
        }
    }

    #[must_use]
    pub fn total_turns(&self) -> u64 {
        self.game_lengths.iter().map(|t| u64::from(*t)).sum()
    }

    /// Append new rows to the session CSVs under `dir`.
    pub fn save_csv(&mut self, dir: &Path) -> Result<(), ExportError> {
        fs::create_dir_all(dir)?;
        let id = &self.session_id;

        let mut rows = String::new();
        for i in self.cursor.episodes..self.episode_rewards.len() {
            let _ = writeln!(
                rows,
                "{id},{i},{},{},{}",
                self.episode_rewards[i],
                self.cumulative_rewards.get(i).copied().unwrap_or_default(),
                self.exploration_rates.get(i).copied().unwrap_or_default()
            );
        }
        append(
            &dir.join("episode_metrics.csv"),
            "SessionID,Episode,Reward,CumulativeReward,ExplorationRate",
            &rows,
        )?;

        rows.clear();
        for i in self.cursor.steps..self.losses.len() {
            let _ = writeln!(
                rows,
                "{id},{i},{},{},{}",
                self.losses[i],
                self.td_errors.get(i).copied().unwrap_or_default(),
                self.mean_q_values.get(i).copied().unwrap_or_default()
            );
        }
        append(
            &dir.join("training_metrics.csv"),
            "SessionID,Step,Loss,TDError,AvgQValue",
            &rows,
        )?;

        rows.clear();
        for i in self.cursor.games..self.game_wins.len() {
            let _ = writeln!(
                rows,
                "{id},{i},{},{}",
                u8::from(self.game_wins[i]),
                self.game_lengths.get(i).copied().unwrap_or_default()
            );
        }
        append(&dir.join("game_results.csv"), "SessionID,Game,Win,Turns", &rows)?;

        rows.clear();
        for (action, count) in &self.action_counts {
            let total = self.action_rewards.get(action).copied().unwrap_or_default();
            let _ = writeln!(
                rows,
                "{id},{action},{},{count},{total:.2},{:.2}",
                display_action(*action),
                total / (*count).max(1) as f64
            );
        }
        append(
            &dir.join("action_distribution.csv"),
            "SessionID,ActionType,ActionName,Count,TotalReward,AverageReward",
            &rows,
        )?;

        rows.clear();
        for (i, s) in self.strategic.iter().enumerate().skip(self.cursor.strategic) {
            let _ = writeln!(
                rows,
                "{id},{i},{},{},{},{}",
                s.objective_control, s.unit_count_diff, s.resource_diff, s.structures_captured
            );
        }
        append(
            &dir.join("strategic_metrics.csv"),
            "SessionID,Episode,ObjectiveControl,UnitCountDiff,ResourceDiff,StructuresCaptured",
            &rows,
        )?;

        append(&dir.join("session_summary.txt"), "", &self.summary())?;

        self.cursor = ExportCursor {
            episodes: self.episode_rewards.len(),
            steps: self.losses.len(),
            games: self.game_wins.len(),
            strategic: self.strategic.len(),
        };
        Ok(())
    }

    /// Human-readable session summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let games = self.games_played();
        let mut out = String::new();
        let _ = writeln!(out, "Session ID: {}", self.session_id);
        let _ = writeln!(out, "Games Played: {games}");
        let _ = writeln!(out, "Wins: {} ({:.1}%)", self.wins(), self.win_rate() * 100.0);
        let _ = writeln!(out, "Total Turns: {}", self.total_turns());
        let average_length = if games > 0 {
            self.total_turns() as f64 / games as f64
        } else {
            0.0
        };
        let _ = writeln!(out, "Average Game Length: {average_length:.1} turns");
        if !self.episode_rewards.is_empty() {
            let mean = self.episode_rewards.iter().sum::<f32>() / self.episode_rewards.len() as f32;
            let _ = writeln!(out, "Average Episode Reward: {mean:.2}");
        }
        if let Some(rate) = self.exploration_rates.last() {
            let _ = writeln!(out, "Final Exploration Rate: {rate:.4}");
        }
        let _ = writeln!(out, "\nAction Distribution:");
        for (action, count) in &self.action_counts {
            let total = self.action_rewards.get(action).copied().unwrap_or_default();
            let _ = writeln!(
                out,
                "  {}: {count} times, Avg Reward: {:.2}",
                display_action(*action),
                total / (*count).max(1) as f64
            );
        }
        let _ = writeln!(out, "--------------------------------------------------");
        out
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a saved record. Its rows count as already exported.
    pub fn load_json(path: &Path) -> Result<Self, ExportError> {
        let mut metrics: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        metrics.cursor = ExportCursor {
            episodes: metrics.episode_rewards.len(),
            steps: metrics.losses.len(),
            games: metrics.game_wins.len(),
            strategic: metrics.strategic.len(),
        };
        Ok(metrics)
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a weight statistics report.
pub fn export_weight_stats(
    path: &Path,
    stats: &WeightStats,
    exploration: f64,
    average_loss: f32,
    recent_loss: f32,
) -> Result<(), ExportError> {
    let mut out = String::from("Statistic,Value\n");
    let _ = writeln!(out, "MinWeight,{}", stats.min);
    let _ = writeln!(out, "MaxWeight,{}", stats.max);
    let _ = writeln!(out, "MeanWeight,{}", stats.mean);
    let _ = writeln!(out, "StdDevWeight,{}", stats.std_dev);
    let _ = writeln!(out, "WeightCount,{}", stats.count);
    let _ = writeln!(out, "\nLearningMetric,Value");
    let _ = writeln!(out, "ExplorationRate,{exploration}");
    let _ = writeln!(out, "AverageLoss,{average_loss}");
    let _ = writeln!(out, "RecentAverageLoss,{recent_loss}");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, out)?;
    Ok(())
}

fn display_action(action: usize) -> String {
    action_name(action)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Action{action}"))
}

/// Append `rows` to `path`, writing `header` first if the file is new.
fn append(path: &Path, header: &str, rows: &str) -> Result<(), ExportError> {
    let created = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if created && !header.is_empty() {
        writeln!(file, "{header}")?;
    }
    file.write_all(rows.as_bytes())?;
    Ok(())
}
