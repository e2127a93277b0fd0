//! Logic Module - Incident Detection & Trust Scoring Engine
//!
//! Data flow:
//! `detection` (raw samples) -> `tracker` (debounce) -> `incident` (ledger)
//! -> `score` (trust score) -> `proof` (digest at session end) -> `vault`.
//!
//! `session` owns one exam attempt; `pipeline` runs it behind an ordered queue.

pub mod config;
pub mod error;
pub mod detection;
pub mod incident;
pub mod tracker;
pub mod score;
pub mod proof;
pub mod session;
pub mod pipeline;
pub mod vault;

// Re-export common types
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use detection::{DetectionSample, RawSample};
pub use incident::{IncidentClass, IncidentLedger, IncidentRecord};
pub use proof::ProofDigest;
pub use session::{ProctorSession, SessionState};
pub use pipeline::{FinalizeRequest, SessionPipeline, SessionView};
