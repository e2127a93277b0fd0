//! Engine error taxonomy

use thiserror::Error;

use crate::logic::session::SessionState;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Operation not allowed in the current session state (finalize twice, no session, aborted)
    #[error("invalid session state: cannot {operation} while session is {state:?}")]
    InvalidSessionState {
        operation: &'static str,
        state: SessionState,
    },

    /// Sample rejected by normalization; dropped without touching tracker state
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// Finalize called without an exam or subject identity; the session stays `Ended`
    #[error("invalid finalize request: {0}")]
    InvalidFinalizeRequest(String),

    /// Canonical serialization or digest primitive failed
    #[error("hash computation failed: {0}")]
    HashComputationFailure(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        EngineError::InvalidSessionState { operation, state }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::HashComputationFailure(err.to_string())
    }
}
