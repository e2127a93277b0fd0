//! Proof Finalizer - builds the immutable digest from a frozen session

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::RngCore;

use super::digest::{hash_subject, sha256_hex, ProofDigest};
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::IncidentLedger;

/// Salt length in bytes before hex encoding
const SALT_BYTES: usize = 16;

/// Frozen session inputs for finalization
#[derive(Debug, Clone)]
pub struct FinalizeInput<'a> {
    pub exam_id: &'a str,
    pub subject_id: &'a str,
    pub salt: &'a str,
    pub ledger: &'a IncidentLedger,
    pub score: u8,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub detection_count: u64,
    pub answers: Option<BTreeMap<String, String>>,
}

/// Pure function of its input: same input, same digest
pub fn finalize(input: FinalizeInput<'_>) -> EngineResult<ProofDigest> {
    if input.exam_id.trim().is_empty() {
        return Err(EngineError::InvalidFinalizeRequest("exam id is empty".into()));
    }
    if input.subject_id.trim().is_empty() {
        return Err(EngineError::InvalidFinalizeRequest("subject id is empty".into()));
    }

    let subject_hash = hash_subject(input.subject_id, input.salt);

    let mut digest = ProofDigest {
        exam_id: input.exam_id.to_string(),
        subject_hash,
        score: input.score,
        incident_count: input.ledger.len() as u32,
        incident_summary: input.ledger.summary(),
        detection_count: input.detection_count,
        started_at: input.started_at,
        ended_at: input.ended_at,
        timestamp: input.ended_at.timestamp_millis(),
        answers: input.answers,
        payload_hash: String::new(),
    };

    let payload = digest.canonical_bytes()?;
    digest.payload_hash = sha256_hex(&payload);

    log::info!(
        "Proof digest for exam '{}': score={}, incidents={}, hash={}...",
        digest.exam_id,
        digest.score,
        digest.incident_count,
        &digest.payload_hash[..12]
    );

    Ok(digest)
}

/// Random per-session salt (hex)
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
