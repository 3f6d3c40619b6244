//! Error types.
//!
//! Search, enumeration and evaluation never fail; errors only come from the
//! edges of the crate: model files, metric exports, and the live world.

use std::path::PathBuf;

use thiserror::Error;

use crate::actions::ActionKind;
use crate::core::UnitId;

/// Failure loading or saving a value network.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model shape mismatch in {field}: expected {expected}, found {found}")]
    Shape {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failure writing training metrics or replay samples.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure executing an action against the live world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown unit: {0}")]
    UnknownUnit(UnitId),

    #[error("{unit} cannot perform {kind:?}: {reason}")]
    IllegalAction {
        unit: UnitId,
        kind: ActionKind,
        reason: String,
    },
}
