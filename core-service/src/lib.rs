//! Proctor Core - Incident Detection & Trust Scoring Engine
//!
//! Debounces per-frame proctoring detections (face count, gaze, phone) into
//! an incident ledger, keeps a bounded trust score and commits both to a
//! SHA-256 proof digest at the end of the session.

pub mod constants;
pub mod logic;

pub use logic::*;
