//! Error types for conceptsum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot build program for {problem}: {reason}")]
    Construction { problem: String, reason: String },

    #[error("Solver failure for {problem}: {reason}")]
    Solver { problem: String, reason: String },

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn construction(problem: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            problem: problem.into(),
            reason: reason.into(),
        }
    }

    pub fn solver(problem: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Solver {
            problem: problem.into(),
            reason: reason.into(),
        }
    }

    /// Problem identifier carried by per-problem errors.
    pub fn problem_id(&self) -> Option<&str> {
        match self {
            Self::Construction { problem, .. } | Self::Solver { problem, .. } => Some(problem),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
