//! Error types for the quest builder client.
//!
//! [`BuilderError`] covers every way a backend round trip or the local
//! configuration can fail. The session controller never shows these to the
//! user verbatim; they are logged and replaced by a fixed apology.

use std::time::Duration;

use quest_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// The request never produced an HTTP response.
    #[error("backend request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body was not the expected JSON shape.
    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    /// No answer within the configured request timeout.
    #[error("backend did not answer within {0:?}")]
    Timeout(Duration),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A library quest id that is not in the loaded list.
    #[error("quest not found: {0}")]
    QuestNotFound(String),

    /// A graph could not be applied to the workspace.
    #[error(transparent)]
    Graph(#[from] CoreError),
}

impl BuilderError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BuilderError::Transport(_) | BuilderError::Timeout(_) => true,
            BuilderError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The backend's own explanation, when it sent one.
    pub fn backend_detail(&self) -> Option<&str> {
        match self {
            BuilderError::Status { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}
