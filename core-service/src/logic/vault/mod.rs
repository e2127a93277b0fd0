//! Proof Vault - submission-side checks for finalized digests
//!
//! Mirrors the on-chain vault the digests are submitted to:
//! - exams are registered with a time window and a minimum trust score
//! - one proof per (exam, anonymized subject)
//! - scores outside [0, 100] or digests whose hash does not verify are refused
//!
//! Exams and proofs persist through a pluggable `ProofStore`.
//! Only the configured creator registers exams; only an exam's instructor closes it.
//!
//! # Architecture
//! - `types.rs`: `VaultConfig`, `ExamMetadata`, `StoredProof`, `SubmissionReceipt`
//! - `store.rs`: `ProofStore` trait, memory + JSONL stores
//! - `error.rs`: `VaultError`

pub mod error;
pub mod store;
pub mod types;

use chrono::{DateTime, Utc};

use crate::constants::{self, MAX_TRUST_SCORE};
use crate::logic::proof::ProofDigest;

pub use error::{VaultError, VaultResult};
pub use store::{JsonlProofStore, MemoryProofStore, ProofStore};
pub use types::{
    proof_key, ExamMetadata, StoredProof, SubmissionReceipt, VaultConfig, VaultInfo, VaultRecord,
};

pub struct ProofVault<S: ProofStore> {
    config: VaultConfig,
    store: S,
}

impl<S: ProofStore> ProofVault<S> {
    pub fn new(config: VaultConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn info(&self) -> VaultInfo {
        VaultInfo {
            name: constants::VAULT_NAME.to_string(),
            version: constants::APP_VERSION.to_string(),
            app_id: self.config.app_id,
            creator: self.config.creator.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // EXAMS
    // ------------------------------------------------------------------------

    /// Register an exam opening at `now`. Only the vault creator may call this;
    /// the caller becomes the exam's instructor.
    pub fn create_exam(
        &self,
        caller: &str,
        exam_id: &str,
        duration_minutes: u64,
        min_trust_score: u8,
        now: DateTime<Utc>,
    ) -> VaultResult<ExamMetadata> {
        if caller != self.config.creator {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
                action: "create exams",
            });
        }
        if min_trust_score > MAX_TRUST_SCORE {
            return Err(VaultError::ScoreOutOfRange(min_trust_score));
        }

        let exam = ExamMetadata::new(exam_id, caller, now, duration_minutes, min_trust_score);
        if !self.store.insert_exam(&exam)? {
            return Err(VaultError::ExamExists(exam_id.to_string()));
        }

        log::info!(
            "Exam '{}' open until {} (min score {})",
            exam_id,
            exam.end_time.to_rfc3339(),
            min_trust_score
        );
        Ok(exam)
    }

    pub fn get_exam(&self, exam_id: &str) -> VaultResult<ExamMetadata> {
        self.store
            .get_exam(exam_id)?
            .ok_or_else(|| VaultError::ExamNotFound(exam_id.to_string()))
    }

    /// Instructor only
    pub fn close_exam(&self, caller: &str, exam_id: &str) -> VaultResult<()> {
        let mut exam = self.get_exam(exam_id)?;
        if exam.instructor != caller {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
                action: "close this exam",
            });
        }
        if !exam.is_active {
            return Ok(());
        }

        exam.is_active = false;
        self.store.update_exam(&exam)?;
        log::info!("Exam '{}' closed by {}", exam_id, caller);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // PROOFS
    // ------------------------------------------------------------------------

    pub fn submit_proof(&self, digest: &ProofDigest, now: DateTime<Utc>) -> VaultResult<SubmissionReceipt> {
        let exam = self.get_exam(&digest.exam_id)?;

        if !exam.is_active {
            return Err(VaultError::ExamInactive(exam.exam_id));
        }
        if !exam.is_open_at(now) {
            return Err(VaultError::OutsideWindow {
                exam_id: exam.exam_id,
                at: now.to_rfc3339(),
            });
        }
        if digest.score > MAX_TRUST_SCORE {
            return Err(VaultError::ScoreOutOfRange(digest.score));
        }
        if digest.score < exam.min_trust_score {
            return Err(VaultError::ScoreBelowMinimum {
                score: digest.score,
                minimum: exam.min_trust_score,
            });
        }
        if !digest.verify() {
            return Err(VaultError::HashMismatch);
        }

        let key = proof_key(&digest.exam_id, &digest.subject_hash);
        let stored = StoredProof {
            proof_key: key.clone(),
            app_id: self.config.app_id,
            submitted_at: now,
            digest: digest.clone(),
        };
        if !self.store.insert_new(&stored)? {
            return Err(VaultError::DuplicateSubmission(key));
        }

        log::info!("Proof submitted: {} (app {}, score {})", key, self.config.app_id, digest.score);

        Ok(SubmissionReceipt {
            app_id: self.config.app_id,
            proof_key: key,
            payload_hash: digest.payload_hash.clone(),
            submitted_at: now,
        })
    }

    pub fn get_proof(&self, exam_id: &str, subject_hash: &str) -> VaultResult<StoredProof> {
        let key = proof_key(exam_id, subject_hash);
        self.store
            .get(&key)?
            .ok_or(VaultError::ProofNotFound(key))
    }

    pub fn verify_proof_exists(&self, exam_id: &str, subject_hash: &str) -> VaultResult<bool> {
        self.store.contains(&proof_key(exam_id, subject_hash))
    }

    /// Stateless validity check (score range + hash)
    pub fn verify_submission(&self, digest: &ProofDigest) -> bool {
        digest.verify()
    }

    pub fn list_proofs(&self) -> VaultResult<Vec<StoredProof>> {
        self.store.list()
    }

    /// Dashboard "clear all proofs". Exam registrations are kept.
    pub fn clear_proofs(&self) -> VaultResult<usize> {
        self.store.clear()
    }
}
