//! Debounce Tracker - turns flickering per-frame detections into incidents
//!
//! One state record per `IncidentClass`:
//! - a consecutive-hit counter, fully reset by a single non-triggering sample
//! - the time of the last logged incident, gating a per-class cooldown
//!
//! An incident fires when the current sample triggers, the streak has reached
//! the class threshold (at least one sample), and the cooldown has elapsed
//! strictly. Firing resets the streak.
//!
//! The reset is a hard reset, not a decay: one clean frame cancels an
//! almost-qualifying streak, trading false positives for false negatives.


use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::config::EngineConfig;
use crate::logic::detection::DetectionSample;
use crate::logic::incident::{IncidentClass, IncidentRecord};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    pub consecutive_count: u32,
    pub last_logged_at: Option<DateTime<Utc>>,
}

impl TrackerState {
    fn cooldown_elapsed(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_logged_at {
            Some(last) => now.signed_duration_since(last) > cooldown,
            None => true,
        }
    }
}

// ============================================================================
// TRACKER
// ============================================================================

#[derive(Debug, Clone)]
pub struct DebounceTracker {
    thresholds: [u32; 5],
    cooldown: Duration,
    states: [TrackerState; 5],
}

impl DebounceTracker {
    pub fn new(config: &EngineConfig) -> Self {
        let mut thresholds = [0u32; 5];
        for class in IncidentClass::ALL {
            thresholds[class.index()] = config.threshold_for(class);
        }

        Self {
            thresholds,
            cooldown: config.cooldown(),
            states: [TrackerState::default(); 5],
        }
    }

    pub fn state(&self, class: IncidentClass) -> &TrackerState {
        &self.states[class.index()]
    }

    pub fn threshold(&self, class: IncidentClass) -> u32 {
        self.thresholds[class.index()]
    }

    /// Trigger predicate of a class over one sample
    pub fn is_triggered(class: IncidentClass, sample: &DetectionSample) -> bool {
        match class {
            IncidentClass::NoFace | IncidentClass::Absence => sample.face_count == 0,
            IncidentClass::MultiFace => sample.face_count > 1,
            IncidentClass::LookingAway => !sample.looking_at_screen,
            IncidentClass::PhoneDetected => sample.phone_detected,
        }
    }

    /// Feed one sample. Returns the incidents it qualifies (unsequenced),
    /// in `IncidentClass::ALL` order.
    pub fn observe(&mut self, sample: &DetectionSample) -> Vec<IncidentRecord> {
        let now = sample.timestamp;
        let mut fired = Vec::new();

        for class in IncidentClass::ALL {
            let idx = class.index();
            let threshold = self.thresholds[idx].max(1);
            let state = &mut self.states[idx];

            if !Self::is_triggered(class, sample) {
                if state.consecutive_count > 0 {
                    log::trace!("{} streak cleared at {}", class, state.consecutive_count);
                }
                state.consecutive_count = 0;
                continue;
            }

            state.consecutive_count = state.consecutive_count.saturating_add(1);

            if state.consecutive_count < threshold {
                continue;
            }

            if !state.cooldown_elapsed(now, self.cooldown) {
                log::debug!(
                    "{} streak {} suppressed by cooldown",
                    class,
                    state.consecutive_count
                );
                continue;
            }

            let detail = describe(class, sample, state.consecutive_count);
            state.last_logged_at = Some(now);
            state.consecutive_count = 0;
            fired.push(IncidentRecord::new(class, now, detail));
        }

        debug_assert!(
            !(fired.iter().any(|r| r.class == IncidentClass::NoFace)
                && fired.iter().any(|r| r.class == IncidentClass::MultiFace)),
            "NoFace and MultiFace are mutually exclusive"
        );

        fired
    }

    /// Forget all streaks and cooldowns
    pub fn reset(&mut self) {
        self.states = [TrackerState::default(); 5];
    }
}

fn describe(class: IncidentClass, sample: &DetectionSample, streak: u32) -> String {
    match class {
        IncidentClass::NoFace => format!("No face detected for {} consecutive frames", streak),
        IncidentClass::MultiFace => format!(
            "{} faces detected for {} consecutive frames",
            sample.face_count, streak
        ),
        IncidentClass::LookingAway => {
            format!("Looking away from screen for {} consecutive frames", streak)
        }
        IncidentClass::PhoneDetected => "Mobile phone detected in frame".to_string(),
        IncidentClass::Absence => format!("Candidate absent for {} consecutive frames", streak),
    }
}
