//! Static evaluation of snapshots.

pub mod heuristic;

pub use heuristic::{HeuristicEvaluator, ScoreBreakdown, SCORE_BOUND};
