use chrono::{DateTime, TimeZone, Utc};

use super::{ProctorSession, SessionState};
use crate::logic::config::EngineConfig;
use crate::logic::detection::RawSample;
use crate::logic::error::EngineError;
use crate::logic::incident::IncidentClass;
use crate::logic::proof::hash_subject;

const SALT: &str = "session-salt";

fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn started(config: EngineConfig) -> ProctorSession {
    let mut session = ProctorSession::new(config.with_salt(SALT));
    session.start(ts(0)).unwrap();
    session
}

/// Deterministic pseudo-random stream (LCG) covering every trigger
fn noisy_stream(len: usize) -> Vec<RawSample> {
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    (0..len)
        .map(|i| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let faces = ((seed >> 33) % 4) as i64 - 1; // -1..=2
            let phone = (seed >> 40) % 7 == 0;
            // Jittered cadence: 400-900 ms
            let step = 400 + ((seed >> 20) % 500) as i64;
            RawSample::new(faces, phone, ts(i as i64 * 1_000 + step))
        })
        .collect()
}

#[test]
fn test_end_to_end_scenario() {
    let mut session = started(EngineConfig::default());

    for i in 0..6 {
        session.push_sample(0, false, ts(i * 500));
    }
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.ledger().count_by_class(IncidentClass::NoFace), 1);
    assert_eq!(session.current_score(), 95);

    session.push_sample(1, true, ts(3_000));
    assert_eq!(session.ledger().len(), 2);
    assert_eq!(session.recent_incidents(1)[0].class, IncidentClass::PhoneDetected);
    assert_eq!(session.current_score(), 80);

    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.score, 80);
    assert_eq!(digest.incident_count, 2);
    assert_eq!(digest.subject_hash, hash_subject("studentX", SALT));
    assert_eq!(digest.detection_count, 7);
    assert_eq!(digest.timestamp, 3_000);
    assert!(digest.verify());
    assert_eq!(session.state(), SessionState::Finalized);
}

#[test]
fn test_score_bounded_and_ledger_monotonic() {
    let config = EngineConfig {
        incident_cooldown_ms: 0,
        no_face_threshold: 1,
        absence_threshold: 2,
        multi_face_threshold: 1,
        looking_away_threshold: 1,
        ..Default::default()
    };
    let mut session = started(config);
    let mut last_len = 0;

    for raw in noisy_stream(400) {
        session.push_raw(&raw);
        let score = session.current_score();
        assert!(score <= 100);
        assert!(session.ledger().len() >= last_len);
        last_len = session.ledger().len();
    }
    // Aggressive config drives the score to the floor
    assert_eq!(session.current_score(), 0);
}

#[test]
fn test_identical_streams_identical_digests() {
    let run = || {
        let mut session = started(EngineConfig::default());
        for raw in noisy_stream(200) {
            session.push_raw(&raw);
        }
        let ledger = session.ledger().clone();
        let digest = session.finalize("exam-1", "subject-1").unwrap();
        (ledger, digest)
    };

    let (ledger_a, digest_a) = run();
    let (ledger_b, digest_b) = run();
    assert_eq!(ledger_a, ledger_b);
    assert_eq!(digest_a.score, digest_b.score);
    assert_eq!(digest_a.payload_hash, digest_b.payload_hash);
    assert_eq!(digest_a, digest_b);
}

#[test]
fn test_finalize_is_single_shot() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, false, ts(500));

    assert!(session.finalize("examA", "studentX").is_ok());
    let second = session.finalize("examA", "studentX");
    assert!(matches!(
        second,
        Err(EngineError::InvalidSessionState { state: SessionState::Finalized, .. })
    ));
}

#[test]
fn test_finalize_without_session_fails() {
    let mut session = ProctorSession::new(EngineConfig::default());
    assert!(matches!(
        session.finalize("examA", "studentX"),
        Err(EngineError::InvalidSessionState { state: SessionState::Idle, .. })
    ));
    // State unaffected
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_aborted_session_yields_no_digest() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, true, ts(100));
    assert_eq!(session.ledger().len(), 1);

    session.abort().unwrap();
    assert!(session.ledger().is_empty());
    assert_eq!(session.current_score(), 100);
    assert!(session.finalize("examA", "studentX").is_err());
}

#[test]
fn test_invalid_sample_leaves_state_untouched() {
    let mut session = started(EngineConfig::default());
    for i in 0..4 {
        session.push_sample(0, false, ts(i * 500));
    }
    let before = *session.tracker.state(IncidentClass::NoFace);

    // Absurd face count: neither a trigger nor a reset
    session.push_sample(1_000, false, ts(2_000));
    // Time regression
    session.push_sample(1, false, ts(100));

    assert_eq!(*session.tracker.state(IncidentClass::NoFace), before);
    assert_eq!(session.dropped_count(), 2);
    assert_eq!(session.detection_count(), 4);

    // Fifth real no-face frame completes the streak
    session.push_sample(0, false, ts(2_500));
    assert_eq!(session.ledger().count_by_class(IncidentClass::NoFace), 1);
}

#[test]
fn test_negative_face_count_counts_as_no_face() {
    let mut session = started(EngineConfig::default());
    for i in 0..5 {
        session.push_sample(-1, false, ts(i * 500));
    }
    assert_eq!(session.ledger().count_by_class(IncidentClass::NoFace), 1);
}

#[test]
fn test_samples_after_end_are_ignored() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, false, ts(500));
    session.end(ts(1_000)).unwrap();

    assert_eq!(session.push_sample(1, true, ts(1_500)), 0);
    assert!(session.ledger().is_empty());

    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.timestamp, 1_000);
    assert_eq!(digest.detection_count, 1);
}

#[test]
fn test_start_twice_rejected() {
    let mut session = started(EngineConfig::default());
    assert!(session.start(ts(10)).is_err());
}

#[test]
fn test_invalid_config_rejected_at_start() {
    let config = EngineConfig {
        no_face_threshold: 10,
        absence_threshold: 1,
        ..Default::default()
    };
    let mut session = ProctorSession::new(config);
    assert!(matches!(session.start(ts(0)), Err(EngineError::InvalidConfig(_))));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_answers_change_payload_hash() {
    let mut with = started(EngineConfig::default());
    let mut without = started(EngineConfig::default());
    with.push_sample(1, false, ts(500));
    without.push_sample(1, false, ts(500));

    let mut answers = std::collections::BTreeMap::new();
    answers.insert("q1".to_string(), "B".to_string());

    let a = with.finalize_with_answers("examA", "studentX", Some(answers)).unwrap();
    let b = without.finalize("examA", "studentX").unwrap();
    assert_ne!(a.payload_hash, b.payload_hash);
    assert!(a.verify());
    // Hashing the same fields twice is byte-identical
    assert_eq!(a.compute_payload_hash().unwrap(), a.payload_hash);
}

#[test]
fn test_breakdown_matches_score() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, true, ts(0));
    session.push_sample(2, false, ts(500));
    session.push_sample(2, false, ts(1_000));
    session.push_sample(2, false, ts(1_500));

    let breakdown = session.breakdown();
    assert_eq!(breakdown.score, session.current_score());
    assert_eq!(session.current_score(), 100 - 15 - 10);
}

#[test]
fn test_end_before_start_clamps_to_start() {
    let mut session = ProctorSession::new(EngineConfig::default().with_salt(SALT));
    session.start(ts(10_000)).unwrap();
    session.end(ts(0)).unwrap();

    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.started_at, ts(10_000));
    assert_eq!(digest.ended_at, ts(10_000));
    assert_eq!(digest.timestamp, 10_000);
}

#[test]
fn test_end_before_last_sample_clamps_to_sample() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, false, ts(4_000));
    session.end(ts(1_000)).unwrap();

    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.timestamp, 4_000);
    assert!(digest.ended_at >= digest.started_at);
}

#[test]
fn test_finalize_from_ended_state_once() {
    let mut session = started(EngineConfig::default());
    session.push_sample(1, true, ts(500));
    session.end(ts(2_000)).unwrap();
    assert_eq!(session.state(), SessionState::Ended);

    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.incident_count, 1);
    assert_eq!(digest.timestamp, 2_000);

    assert!(matches!(
        session.finalize("examA", "studentX"),
        Err(EngineError::InvalidSessionState { state: SessionState::Finalized, .. })
    ));
}

#[test]
fn test_failed_finalize_can_be_retried() {
    let stream = |session: &mut ProctorSession| {
        for i in 0..6 {
            session.push_sample(0, false, ts(i * 500));
        }
        session.push_sample(1, true, ts(3_000));
    };

    let mut reference = started(EngineConfig::default());
    stream(&mut reference);
    let expected = reference.finalize("examA", "studentX").unwrap();

    let mut session = started(EngineConfig::default());
    stream(&mut session);

    assert!(matches!(
        session.finalize("", "studentX"),
        Err(EngineError::InvalidFinalizeRequest(_))
    ));
    assert_eq!(session.state(), SessionState::Ended);
    assert!(matches!(
        session.finalize("examA", "  "),
        Err(EngineError::InvalidFinalizeRequest(_))
    ));
    assert_eq!(session.state(), SessionState::Ended);

    // Nothing counted twice across the failed attempts
    let digest = session.finalize("examA", "studentX").unwrap();
    assert_eq!(digest.incident_count, 2);
    assert_eq!(digest.score, 80);
    assert_eq!(digest.payload_hash, expected.payload_hash);
    assert_eq!(digest, expected);
    assert_eq!(session.state(), SessionState::Finalized);
}

#[test]
fn test_unsalted_sessions_hash_subject_differently() {
    let run = || {
        let mut session = ProctorSession::new(EngineConfig::default());
        session.start(ts(0)).unwrap();
        session.push_sample(1, false, ts(500));
        session.finalize("examA", "studentX").unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.score, b.score);
    assert_ne!(a.subject_hash, b.subject_hash);
    assert_ne!(a.payload_hash, b.payload_hash);
}
