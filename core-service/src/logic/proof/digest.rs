//! Proof Digest
//!
//! The canonical payload is compact JSON with a fixed key order:
//! `examId, subjectHash, score, incidentCount, timestamp[, answers]`.
//! `timestamp` is Unix milliseconds, `answers` is omitted when absent and
//! its keys are sorted. `payloadHash` = hex(SHA-256(payload)).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::error::EngineResult;
use crate::logic::incident::IncidentClass;

/// Session digest handed to the submission collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDigest {
    pub exam_id: String,
    /// hex(SHA-256(subject_id || salt)); the raw subject id never leaves the engine
    pub subject_hash: String,
    pub score: u8,
    pub incident_count: u32,
    pub incident_summary: BTreeMap<IncidentClass, u32>,
    /// Raw samples processed during the session
    pub detection_count: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Unix ms of session end
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<BTreeMap<String, String>>,
    pub payload_hash: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalPayload<'a> {
    exam_id: &'a str,
    subject_hash: &'a str,
    score: u8,
    incident_count: u32,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    answers: Option<&'a BTreeMap<String, String>>,
}

/// Canonical byte encoding of the hashed fields
pub fn canonical_payload(
    exam_id: &str,
    subject_hash: &str,
    score: u8,
    incident_count: u32,
    timestamp: i64,
    answers: Option<&BTreeMap<String, String>>,
) -> EngineResult<Vec<u8>> {
    let payload = CanonicalPayload {
        exam_id,
        subject_hash,
        score,
        incident_count,
        timestamp,
        answers,
    };
    Ok(serde_json::to_vec(&payload)?)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Anonymized subject id: hex(SHA-256(subject_id || salt))
pub fn hash_subject(subject_id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject_id.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

impl ProofDigest {
    pub fn canonical_bytes(&self) -> EngineResult<Vec<u8>> {
        canonical_payload(
            &self.exam_id,
            &self.subject_hash,
            self.score,
            self.incident_count,
            self.timestamp,
            self.answers.as_ref(),
        )
    }

    /// Recompute the payload hash from the other fields
    pub fn compute_payload_hash(&self) -> EngineResult<String> {
        Ok(sha256_hex(&self.canonical_bytes()?))
    }

    /// True when `payload_hash` matches the other fields and the score is in range
    pub fn verify(&self) -> bool {
        self.score <= crate::constants::MAX_TRUST_SCORE
            && matches!(self.compute_payload_hash(), Ok(h) if h == self.payload_hash)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_order() {
        let bytes = canonical_payload("examA", "abc", 80, 2, 3_000, None).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"examId":"examA","subjectHash":"abc","score":80,"incidentCount":2,"timestamp":3000}"#
        );
    }

    #[test]
    fn test_answers_sorted_in_payload() {
        let mut answers = BTreeMap::new();
        answers.insert("q2".to_string(), "b".to_string());
        answers.insert("q1".to_string(), "a".to_string());

        let bytes = canonical_payload("e", "s", 100, 0, 0, Some(&answers)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with(r#""answers":{"q1":"a","q2":"b"}}"#));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_subject_hash_is_concatenation() {
        assert_eq!(hash_subject("stu", "dentX"), sha256_hex(b"studentX"));
        assert_eq!(hash_subject("studentX", "salt").len(), 64);
        assert_ne!(hash_subject("studentX", "salt1"), hash_subject("studentX", "salt2"));
    }
}
