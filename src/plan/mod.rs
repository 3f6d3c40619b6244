//! Turn plan generation.

pub mod enumerator;

pub use enumerator::{unit_importance, PlanEnumerator};
