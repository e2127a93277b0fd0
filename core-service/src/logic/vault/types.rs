use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::proof::ProofDigest;

/// Submission collaborator configuration (passed in, never global)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Application id the receipts are issued under
    pub app_id: u64,
    /// JSONL file backing the proof store
    pub store_path: PathBuf,
    /// Only this caller may register exams
    pub creator: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            app_id: constants::DEFAULT_VAULT_APP_ID,
            store_path: constants::get_vault_path(),
            creator: constants::DEFAULT_VAULT_CREATOR.to_string(),
        }
    }
}

impl VaultConfig {
    pub fn from_env() -> Self {
        Self {
            app_id: constants::get_vault_app_id(),
            store_path: constants::get_vault_path(),
            creator: constants::get_vault_creator(),
        }
    }
}

/// Ten years; longer windows are clamped
const MAX_EXAM_MINUTES: u64 = 60 * 24 * 366 * 10;

/// Exam registration (window + minimum score)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMetadata {
    pub exam_id: String,
    /// Caller that registered the exam; the only one allowed to close it
    pub instructor: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub min_trust_score: u8,
    pub is_active: bool,
}

impl ExamMetadata {
    pub fn new(
        exam_id: &str,
        instructor: &str,
        start: DateTime<Utc>,
        duration_minutes: u64,
        min_trust_score: u8,
    ) -> Self {
        let minutes = duration_minutes.min(MAX_EXAM_MINUTES) as i64;
        Self {
            exam_id: exam_id.to_string(),
            instructor: instructor.to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            min_trust_score,
            is_active: true,
        }
    }

    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_time && at <= self.end_time
    }
}

/// Persisted proof entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProof {
    pub proof_key: String,
    pub app_id: u64,
    pub submitted_at: DateTime<Utc>,
    pub digest: ProofDigest,
}

/// Returned to the submission flow on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub app_id: u64,
    pub proof_key: String,
    pub payload_hash: String,
    pub submitted_at: DateTime<Utc>,
}

/// Vault identification (name, version, deployment)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultInfo {
    pub name: String,
    pub version: String,
    pub app_id: u64,
    pub creator: String,
}

impl std::fmt::Display for VaultInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} (app {})", self.name, self.version, self.app_id)
    }
}

/// One line of the JSONL vault file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VaultRecord {
    Exam(ExamMetadata),
    Proof(StoredProof),
}

/// Composite key: one proof per (exam, anonymized subject)
pub fn proof_key(exam_id: &str, subject_hash: &str) -> String {
    format!("{}_{}", exam_id, subject_hash)
}
