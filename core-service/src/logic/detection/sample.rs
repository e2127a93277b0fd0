use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::{EngineError, EngineResult};

// ============================================================================
// NORMALIZED SAMPLE
// ============================================================================

/// One evaluated frame, after clamping and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSample {
    pub face_count: u32,
    pub phone_detected: bool,
    pub looking_at_screen: bool,
    pub timestamp: DateTime<Utc>,
}

impl DetectionSample {
    /// Sample with gaze approximated from face count
    pub fn new(face_count: u32, phone_detected: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            face_count,
            phone_detected,
            looking_at_screen: estimate_gaze(face_count),
            timestamp,
        }
    }

    pub fn with_gaze(mut self, looking_at_screen: bool) -> Self {
        self.looking_at_screen = looking_at_screen;
        self
    }
}

/// Gaze approximation: a visible face is assumed to face the screen.
///
/// There is no eye/iris model behind this; scoring thresholds are tuned
/// against exactly this approximation.
pub fn estimate_gaze(face_count: u32) -> bool {
    face_count >= 1
}

// ============================================================================
// RAW SAMPLE (host shape)
// ============================================================================

/// Sample as delivered by the inference host (JSON, millisecond timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    /// May be negative when the detector misbehaves; clamped to 0
    pub face_count: i64,
    #[serde(default)]
    pub phone_detected: bool,
    /// Absent = derive from face count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looking_at_screen: Option<bool>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl RawSample {
    pub fn new(face_count: i64, phone_detected: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            face_count,
            phone_detected,
            looking_at_screen: None,
            timestamp,
        }
    }

    /// Clamp and validate into a `DetectionSample`.
    ///
    /// Rejects face counts above `max_face_count` and timestamps that go
    /// backwards relative to the last accepted sample.
    pub fn normalize(
        &self,
        max_face_count: u32,
        last_accepted: Option<DateTime<Utc>>,
    ) -> EngineResult<DetectionSample> {
        if self.face_count < 0 {
            log::debug!("Clamping negative face count {} to 0", self.face_count);
        }
        let clamped = self.face_count.max(0);

        if clamped > max_face_count as i64 {
            return Err(EngineError::InvalidSample(format!(
                "face count {} exceeds maximum {}",
                clamped, max_face_count
            )));
        }

        if let Some(last) = last_accepted {
            if self.timestamp < last {
                return Err(EngineError::InvalidSample(format!(
                    "timestamp {} precedes last accepted sample {}",
                    self.timestamp.to_rfc3339(),
                    last.to_rfc3339()
                )));
            }
        }

        let face_count = clamped as u32;
        Ok(DetectionSample {
            face_count,
            phone_detected: self.phone_detected,
            looking_at_screen: self
                .looking_at_screen
                .unwrap_or_else(|| estimate_gaze(face_count)),
            timestamp: self.timestamp,
        })
    }
}

impl From<DetectionSample> for RawSample {
    fn from(sample: DetectionSample) -> Self {
        Self {
            face_count: sample.face_count as i64,
            phone_detected: sample.phone_detected,
            looking_at_screen: Some(sample.looking_at_screen),
            timestamp: sample.timestamp,
        }
    }
}
