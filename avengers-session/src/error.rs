use std::path::PathBuf;

use thiserror::Error;

/// Error types for avengers-session operations.
/// These are used by both the library and binary crates.
#[derive(Error, Debug)]
pub enum MissionError {
    #[error("Mission '{0}' not found. Run 'avengers assemble' first.")]
    MissionNotFound(String),

    #[error("Execution plan for mission '{0}' not found. Run 'avengers assemble --subtasks <file>' first.")]
    PlanNotFound(String),

    #[error("Invalid state file {path}: {reason}")]
    InvalidState { path: PathBuf, reason: String },

    #[error("Invalid subtask list: {0}")]
    InvalidSubtasks(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MissionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MissionError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_state(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MissionError::InvalidState {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MissionError>;
