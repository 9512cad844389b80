use std::path::PathBuf;

use thiserror::Error;

/// Run-level error type.
///
/// Only `FirmProfile` stops a run before scoring. Everything else raised while
/// scoring a single solicitation is absorbed by the batch runner and surfaces
/// as an ERROR placeholder report.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Firm profile unavailable at {}: {reason}", path.display())]
    FirmProfile { path: PathBuf, reason: String },

    #[error("Solicitation source error: {0}")]
    Source(String),

    #[error("Semantic evaluator error: {0}")]
    Evaluator(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TriageError {
    /// True when the run cannot start at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TriageError::FirmProfile { .. })
    }
}
