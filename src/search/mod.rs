//! Adversarial plan search.
//!
//! - `SearchEngine`: depth-limited minimax / alpha-beta with a leaf cache
//! - `Guidance`: optional value-network plan ordering and leaf bootstrap
//! - `SearchStats`: node, pruning, and cache counters

pub mod engine;
pub mod stats;

pub use engine::{order_by_q, Guidance, SearchEngine, SearchOutcome};
pub use stats::SearchStats;
