//! Errors for the outer surfaces (CLI input, API payloads)
//!
//! The annotation core itself has no error path: bad spans are dropped and
//! reported on the plan.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EssaymarkError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid highlights JSON: {0}")]
    InvalidHighlights(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl EssaymarkError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
