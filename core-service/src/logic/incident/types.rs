use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of proctoring incident classes.
///
/// Each class carries its own debounce state and a fixed penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncidentClass {
    NoFace,        // 5
    MultiFace,     // 10
    LookingAway,   // 3
    PhoneDetected, // 15
    Absence,       // 8
}

impl IncidentClass {
    /// Evaluation order of the tracker
    pub const ALL: [IncidentClass; 5] = [
        IncidentClass::NoFace,
        IncidentClass::MultiFace,
        IncidentClass::LookingAway,
        IncidentClass::PhoneDetected,
        IncidentClass::Absence,
    ];

    /// Trust score deduction per logged incident
    pub fn penalty(&self) -> u32 {
        match self {
            IncidentClass::NoFace => 5,
            IncidentClass::MultiFace => 10,
            IncidentClass::LookingAway => 3,
            IncidentClass::PhoneDetected => 15,
            IncidentClass::Absence => 8,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            IncidentClass::NoFace => 0,
            IncidentClass::MultiFace => 1,
            IncidentClass::LookingAway => 2,
            IncidentClass::PhoneDetected => 3,
            IncidentClass::Absence => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentClass::NoFace => "no_face",
            IncidentClass::MultiFace => "multi_face",
            IncidentClass::LookingAway => "looking_away",
            IncidentClass::PhoneDetected => "phone_detected",
            IncidentClass::Absence => "absence",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            IncidentClass::NoFace => "No face visible in frame",
            IncidentClass::MultiFace => "More than one person in frame",
            IncidentClass::LookingAway => "Candidate looking away from screen",
            IncidentClass::PhoneDetected => "Mobile phone detected",
            IncidentClass::Absence => "Candidate absent for an extended period",
        }
    }
}

impl std::fmt::Display for IncidentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged incident. Never mutated after it enters the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Position in the ledger (assigned on append)
    pub seq: u64,
    pub class: IncidentClass,
    pub timestamp: DateTime<Utc>,
    pub detail: String,
}

impl IncidentRecord {
    pub fn new(class: IncidentClass, timestamp: DateTime<Utc>, detail: impl Into<String>) -> Self {
        Self {
            seq: 0,
            class,
            timestamp,
            detail: detail.into(),
        }
    }

    pub fn penalty(&self) -> u32 {
        self.class.penalty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_table() {
        assert_eq!(IncidentClass::NoFace.penalty(), 5);
        assert_eq!(IncidentClass::MultiFace.penalty(), 10);
        assert_eq!(IncidentClass::LookingAway.penalty(), 3);
        assert_eq!(IncidentClass::PhoneDetected.penalty(), 15);
        assert_eq!(IncidentClass::Absence.penalty(), 8);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, class) in IncidentClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }
}
