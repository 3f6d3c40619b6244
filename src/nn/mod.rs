//! Learned action values.
//!
//! ## Overview
//!
//! - **Traits**: `ActionValueModel`, `StateEncoder`
//! - **Network**: `ValueNetwork`, a dense Q-network trained online
//! - **Encoding**: `GridStateEncoder` for grid snapshots
//! - **Baseline**: `ConstantModel` for testing

pub mod encoder;
pub mod network;
pub mod traits;

pub use encoder::GridStateEncoder;
pub use network::{TrainResult, ValueNetwork, WeightStats};
pub use traits::{ActionValueModel, ConstantModel, StateEncoder};
