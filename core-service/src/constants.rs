//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden through a `PROCTOR_*` environment variable.

use std::path::PathBuf;

/// Consecutive no-face samples before a `NoFace` incident is logged
pub const DEFAULT_NO_FACE_THRESHOLD: u32 = 5;

/// Consecutive multi-face samples before a `MultiFace` incident is logged
pub const DEFAULT_MULTI_FACE_THRESHOLD: u32 = 3;

/// Consecutive looking-away samples before a `LookingAway` incident is logged
pub const DEFAULT_LOOKING_AWAY_THRESHOLD: u32 = 15;

/// Phone detection is not debounced: first cooldown-eligible sample fires
pub const DEFAULT_PHONE_THRESHOLD: u32 = 0;

/// Consecutive no-face samples before the candidate counts as absent
pub const DEFAULT_ABSENCE_THRESHOLD: u32 = 20;

/// Minimum time between two logged incidents of the same class (ms)
pub const DEFAULT_INCIDENT_COOLDOWN_MS: u64 = 3_000;

/// Face counts above this are treated as detector garbage
pub const DEFAULT_MAX_FACE_COUNT: u32 = 32;

/// Upper bound of the trust score
pub const MAX_TRUST_SCORE: u8 = 100;

/// Default exam duration used when the replay tool registers an exam
pub const DEFAULT_EXAM_DURATION_MINUTES: u64 = 180;

/// Default minimum trust score accepted by the vault
pub const DEFAULT_MIN_TRUST_SCORE: u8 = 0;

/// Default application id of the proof vault (0 = local only)
pub const DEFAULT_VAULT_APP_ID: u64 = 0;

/// Default vault creator (the only caller allowed to register exams)
pub const DEFAULT_VAULT_CREATOR: &str = "local-admin";

/// Vault name reported by `ProofVault::info`
pub const VAULT_NAME: &str = "Proctor Vault";

/// Proof vault file name
pub const VAULT_FILE_NAME: &str = "proofs.jsonl";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Proctor Core";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub fn get_no_face_threshold() -> u32 {
    env_parse("PROCTOR_NO_FACE_THRESHOLD", DEFAULT_NO_FACE_THRESHOLD)
}

pub fn get_multi_face_threshold() -> u32 {
    env_parse("PROCTOR_MULTI_FACE_THRESHOLD", DEFAULT_MULTI_FACE_THRESHOLD)
}

pub fn get_looking_away_threshold() -> u32 {
    env_parse("PROCTOR_LOOKING_AWAY_THRESHOLD", DEFAULT_LOOKING_AWAY_THRESHOLD)
}

pub fn get_phone_threshold() -> u32 {
    env_parse("PROCTOR_PHONE_THRESHOLD", DEFAULT_PHONE_THRESHOLD)
}

pub fn get_absence_threshold() -> u32 {
    env_parse("PROCTOR_ABSENCE_THRESHOLD", DEFAULT_ABSENCE_THRESHOLD)
}

pub fn get_incident_cooldown_ms() -> u64 {
    env_parse("PROCTOR_INCIDENT_COOLDOWN_MS", DEFAULT_INCIDENT_COOLDOWN_MS)
}

pub fn get_max_face_count() -> u32 {
    env_parse("PROCTOR_MAX_FACE_COUNT", DEFAULT_MAX_FACE_COUNT)
}

/// Fixed session salt (testing / reproducible replays). Unset = random per session.
pub fn get_session_salt() -> Option<String> {
    std::env::var("PROCTOR_SESSION_SALT")
        .ok()
        .filter(|s| !s.is_empty())
}

pub fn get_vault_app_id() -> u64 {
    env_parse("PROCTOR_VAULT_APP_ID", DEFAULT_VAULT_APP_ID)
}

pub fn get_vault_creator() -> String {
    std::env::var("PROCTOR_VAULT_CREATOR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VAULT_CREATOR.to_string())
}

pub fn get_exam_duration_minutes() -> u64 {
    env_parse("PROCTOR_EXAM_DURATION_MINUTES", DEFAULT_EXAM_DURATION_MINUTES)
}

pub fn get_min_trust_score() -> u8 {
    env_parse("PROCTOR_MIN_TRUST_SCORE", DEFAULT_MIN_TRUST_SCORE)
}

/// Get vault file path from environment or use the local data dir
pub fn get_vault_path() -> PathBuf {
    std::env::var("PROCTOR_VAULT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("proctor-core")
                .join(VAULT_FILE_NAME)
        })
}
