//! Error types shared across the workspace.
//!
//! `DialogueError` lives here rather than in `ecotutor-providers` so the
//! session loop can classify a failed reply without string matching.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::QuestionId;

/// Errors raised while loading a question dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("failed to read dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a JSON array of question objects.
    #[error("failed to parse dataset {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record parsed but breaks the question schema.
    #[error("invalid record #{index} (id {id}): {reason}")]
    InvalidRecord {
        index: usize,
        id: QuestionId,
        reason: String,
    },

    /// Two records share an id.
    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),
}

/// Errors that can occur when asking a dialogue model for a reply.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// The requested model is not available to the backend.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The model produced nothing but whitespace.
    #[error("model returned an empty reply")]
    EmptyReply,
}

impl DialogueError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, DialogueError::ModelNotFound(_))
    }
}
