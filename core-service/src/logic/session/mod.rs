//! Proctoring Session - owns tracker, ledger and score for one exam attempt
//!
//! Lifecycle: `Idle -> Active -> Ended -> Finalized`, or `-> Aborted`.
//! Sessions are single-shot: a new attempt needs a new `ProctorSession`.
//!
//! Per-sample problems never escape `push_*`: bad samples are logged and
//! dropped without touching tracker state. Finalization errors propagate.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::config::EngineConfig;
use crate::logic::detection::RawSample;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::{IncidentLedger, IncidentRecord};
use crate::logic::proof::{self, FinalizeInput, ProofDigest};
use crate::logic::score::{self, ScoreBreakdown, TrustScore};
use crate::logic::tracker::DebounceTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    Ended,
    Finalized,
    Aborted,
}

pub struct ProctorSession {
    id: Uuid,
    config: EngineConfig,
    state: SessionState,
    salt: String,

    tracker: DebounceTracker,
    ledger: IncidentLedger,
    score: TrustScore,

    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    last_sample_at: Option<DateTime<Utc>>,
    detection_count: u64,
    dropped_count: u64,
}

impl ProctorSession {
    pub fn new(config: EngineConfig) -> Self {
        let salt = config
            .session_salt
            .clone()
            .unwrap_or_else(proof::generate_salt);

        Self {
            id: Uuid::new_v4(),
            tracker: DebounceTracker::new(&config),
            config,
            state: SessionState::Idle,
            salt,
            ledger: IncidentLedger::new(),
            score: TrustScore::new(),
            started_at: None,
            ended_at: None,
            last_sample_at: None,
            detection_count: 0,
            dropped_count: 0,
        }
    }

    // ------------------------------------------------------------------------
    // LIFECYCLE
    // ------------------------------------------------------------------------

    pub fn start(&mut self, at: DateTime<Utc>) -> EngineResult<()> {
        if self.state != SessionState::Idle {
            return Err(EngineError::invalid_state("start", self.state));
        }
        self.config.validate()?;

        self.state = SessionState::Active;
        self.started_at = Some(at);
        log::info!("Proctoring session {} started at {}", self.id, at.to_rfc3339());
        Ok(())
    }

    /// Freeze the session. Later samples are ignored.
    ///
    /// The end time never precedes the start or the last accepted sample.
    pub fn end(&mut self, at: DateTime<Utc>) -> EngineResult<()> {
        if self.state != SessionState::Active {
            return Err(EngineError::invalid_state("end", self.state));
        }
        let ended_at = [Some(at), self.started_at, self.last_sample_at]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(at);
        self.ended_at = Some(ended_at);
        self.state = SessionState::Ended;
        log::info!(
            "Proctoring session {} ended: {} samples, {} incidents, score {}",
            self.id,
            self.detection_count,
            self.ledger.len(),
            self.score.value()
        );
        Ok(())
    }

    /// Discard ledger and score. No digest can be produced afterwards.
    pub fn abort(&mut self) -> EngineResult<()> {
        match self.state {
            SessionState::Active | SessionState::Ended => {
                self.ledger = IncidentLedger::new();
                self.score = TrustScore::new();
                self.tracker.reset();
                self.state = SessionState::Aborted;
                log::warn!("Proctoring session {} aborted", self.id);
                Ok(())
            }
            state => Err(EngineError::invalid_state("abort", state)),
        }
    }

    // ------------------------------------------------------------------------
    // SAMPLE INGESTION
    // ------------------------------------------------------------------------

    /// Inference entry point. Returns the number of incidents logged.
    pub fn push_sample(
        &mut self,
        face_count: i64,
        phone_detected: bool,
        timestamp: DateTime<Utc>,
    ) -> usize {
        self.push_raw(&RawSample::new(face_count, phone_detected, timestamp))
    }

    pub fn push_raw(&mut self, raw: &RawSample) -> usize {
        if self.state != SessionState::Active {
            log::warn!("Sample ignored: session {} is {:?}", self.id, self.state);
            return 0;
        }

        let sample = match raw.normalize(self.config.max_face_count, self.last_sample_at) {
            Ok(sample) => sample,
            Err(e) => {
                self.dropped_count += 1;
                log::warn!("Dropping sample: {}", e);
                return 0;
            }
        };

        self.last_sample_at = Some(sample.timestamp);
        self.detection_count += 1;

        let fired = self.tracker.observe(&sample);
        let logged = fired.len();
        for record in fired {
            let class = record.class;
            let stored = self.ledger.append(record);
            let score = self.score.apply(class);
            log::info!(
                "[INCIDENT] #{} {} at {} - {} (score {})",
                stored.seq,
                class,
                stored.timestamp.to_rfc3339(),
                stored.detail,
                score
            );
        }

        debug_assert_eq!(self.score.value(), TrustScore::recompute(&self.ledger));
        logged
    }

    // ------------------------------------------------------------------------
    // READ-ONLY VIEWS
    // ------------------------------------------------------------------------

    pub fn current_score(&self) -> u8 {
        self.score.value()
    }

    pub fn recent_incidents(&self, n: usize) -> Vec<IncidentRecord> {
        self.ledger.recent(n)
    }

    pub fn ledger(&self) -> &IncidentLedger {
        &self.ledger
    }

    pub fn breakdown(&self) -> ScoreBreakdown {
        score::breakdown(&self.ledger)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn detection_count(&self) -> u64 {
        self.detection_count
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    // ------------------------------------------------------------------------
    // FINALIZATION
    // ------------------------------------------------------------------------

    pub fn finalize(&mut self, exam_id: &str, subject_id: &str) -> EngineResult<ProofDigest> {
        self.finalize_with_answers(exam_id, subject_id, None)
    }

    /// Produce the session digest. Single-shot: a second call fails with
    /// `InvalidSessionState`. A failed call leaves the session `Ended` and
    /// can be retried.
    pub fn finalize_with_answers(
        &mut self,
        exam_id: &str,
        subject_id: &str,
        answers: Option<BTreeMap<String, String>>,
    ) -> EngineResult<ProofDigest> {
        match self.state {
            SessionState::Active => {
                let at = self
                    .last_sample_at
                    .or(self.started_at)
                    .unwrap_or_else(Utc::now);
                self.end(at)?;
            }
            SessionState::Ended => {}
            state => return Err(EngineError::invalid_state("finalize", state)),
        }

        let (started_at, ended_at) = match (self.started_at, self.ended_at) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(EngineError::invalid_state("finalize", self.state)),
        };

        let digest = proof::finalize(FinalizeInput {
            exam_id,
            subject_id,
            salt: &self.salt,
            ledger: &self.ledger,
            score: self.score.value(),
            started_at,
            ended_at,
            detection_count: self.detection_count,
            answers,
        })?;

        self.state = SessionState::Finalized;
        Ok(digest)
    }
}
