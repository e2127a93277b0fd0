//! Engine Configuration
//!
//! Per-class debounce thresholds and the shared incident cooldown.
//! Can be loaded from environment, deserialized from the host, or set at runtime.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::incident::IncidentClass;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Engine configuration (option names match the host's camelCase keys)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Consecutive `faceCount == 0` samples before logging `NoFace`
    pub no_face_threshold: u32,
    /// Consecutive `faceCount > 1` samples before logging `MultiFace`
    pub multi_face_threshold: u32,
    /// Consecutive not-looking samples before logging `LookingAway`
    pub looking_away_threshold: u32,
    /// Consecutive phone samples before logging `PhoneDetected` (0 = immediate)
    pub phone_threshold: u32,
    /// Consecutive no-face samples before logging `Absence`
    pub absence_threshold: u32,
    /// Minimum gap between two incidents of the same class (ms)
    pub incident_cooldown_ms: u64,
    /// Face counts above this are rejected as malformed
    pub max_face_count: u32,
    /// Fixed salt for subject anonymization; `None` = random per session.
    ///
    /// With `None`, two sessions fed the same stream yield different
    /// `subject_hash` and `payload_hash` values. Set a salt when digests must
    /// be reproducible across sessions.
    pub session_salt: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            no_face_threshold: constants::DEFAULT_NO_FACE_THRESHOLD,
            multi_face_threshold: constants::DEFAULT_MULTI_FACE_THRESHOLD,
            looking_away_threshold: constants::DEFAULT_LOOKING_AWAY_THRESHOLD,
            phone_threshold: constants::DEFAULT_PHONE_THRESHOLD,
            absence_threshold: constants::DEFAULT_ABSENCE_THRESHOLD,
            incident_cooldown_ms: constants::DEFAULT_INCIDENT_COOLDOWN_MS,
            max_face_count: constants::DEFAULT_MAX_FACE_COUNT,
            session_salt: None,
        }
    }
}

impl EngineConfig {
    /// Load from `PROCTOR_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            no_face_threshold: constants::get_no_face_threshold(),
            multi_face_threshold: constants::get_multi_face_threshold(),
            looking_away_threshold: constants::get_looking_away_threshold(),
            phone_threshold: constants::get_phone_threshold(),
            absence_threshold: constants::get_absence_threshold(),
            incident_cooldown_ms: constants::get_incident_cooldown_ms(),
            max_face_count: constants::get_max_face_count(),
            session_salt: constants::get_session_salt(),
        }
    }

    /// Strict mode - shorter streaks, shorter cooldown
    pub fn strict() -> Self {
        Self {
            no_face_threshold: 3,
            multi_face_threshold: 2,
            looking_away_threshold: 8,
            absence_threshold: 12,
            incident_cooldown_ms: 2_000,
            ..Default::default()
        }
    }

    /// Lenient mode - tolerate longer streaks (noisy webcams)
    pub fn lenient() -> Self {
        Self {
            no_face_threshold: 8,
            multi_face_threshold: 5,
            looking_away_threshold: 30,
            absence_threshold: 40,
            incident_cooldown_ms: 5_000,
            ..Default::default()
        }
    }

    pub fn with_salt(mut self, salt: &str) -> Self {
        self.session_salt = Some(salt.to_string());
        self
    }

    /// Consecutive-sample threshold for a class
    pub fn threshold_for(&self, class: IncidentClass) -> u32 {
        match class {
            IncidentClass::NoFace => self.no_face_threshold,
            IncidentClass::MultiFace => self.multi_face_threshold,
            IncidentClass::LookingAway => self.looking_away_threshold,
            IncidentClass::PhoneDetected => self.phone_threshold,
            IncidentClass::Absence => self.absence_threshold,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::milliseconds(self.incident_cooldown_ms as i64)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.incident_cooldown_ms > i64::MAX as u64 {
            return Err(EngineError::InvalidConfig(format!(
                "incidentCooldownMs {} out of range",
                self.incident_cooldown_ms
            )));
        }
        if self.max_face_count < 2 {
            return Err(EngineError::InvalidConfig(
                "maxFaceCount must allow at least 2 faces".to_string(),
            ));
        }
        if self.absence_threshold < self.no_face_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "absenceThreshold ({}) must not be below noFaceThreshold ({})",
                self.absence_threshold, self.no_face_threshold
            )));
        }
        if matches!(&self.session_salt, Some(s) if s.is_empty()) {
            return Err(EngineError::InvalidConfig("sessionSalt must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.no_face_threshold, 5);
        assert_eq!(config.phone_threshold, 0);
        assert_eq!(config.incident_cooldown_ms, 3_000);
        assert!(config.session_salt.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_phone_is_least_debounced() {
        let config = EngineConfig::default();
        for class in IncidentClass::ALL {
            assert!(config.threshold_for(IncidentClass::PhoneDetected) <= config.threshold_for(class));
        }
        assert!(config.threshold_for(IncidentClass::Absence) > config.threshold_for(IncidentClass::NoFace));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::strict().validate().is_ok());
        assert!(EngineConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_deserialize_host_options() {
        let json = r#"{"noFaceThreshold":7,"lookingAwayThreshold":30,"incidentCooldownMs":1500}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.no_face_threshold, 7);
        assert_eq!(config.looking_away_threshold, 30);
        assert_eq!(config.incident_cooldown_ms, 1500);
        // Unspecified keys keep defaults
        assert_eq!(config.multi_face_threshold, constants::DEFAULT_MULTI_FACE_THRESHOLD);
    }

    #[test]
    fn test_reject_inverted_absence_threshold() {
        let config = EngineConfig {
            no_face_threshold: 10,
            absence_threshold: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_reject_empty_salt() {
        let config = EngineConfig::default().with_salt("");
        assert!(config.validate().is_err());
    }
}
