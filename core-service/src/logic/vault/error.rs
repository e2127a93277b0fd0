use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("exam '{0}' does not exist")]
    ExamNotFound(String),

    #[error("exam '{0}' already exists")]
    ExamExists(String),

    #[error("'{caller}' is not allowed to {action}")]
    Unauthorized { caller: String, action: &'static str },

    #[error("exam '{0}' is not active")]
    ExamInactive(String),

    #[error("exam '{exam_id}' is not open at {at}")]
    OutsideWindow { exam_id: String, at: String },

    #[error("trust score {0} is outside [0, 100]")]
    ScoreOutOfRange(u8),

    #[error("trust score {score} below exam minimum {minimum}")]
    ScoreBelowMinimum { score: u8, minimum: u8 },

    #[error("proof already submitted for '{0}'")]
    DuplicateSubmission(String),

    #[error("payload hash does not match digest fields")]
    HashMismatch,

    #[error("proof '{0}' not found")]
    ProofNotFound(String),

    #[error("vault IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vault serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
