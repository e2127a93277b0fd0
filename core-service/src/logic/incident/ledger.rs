//! Incident Ledger - append-only, time-ordered record of a session

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{IncidentClass, IncidentRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncidentLedger {
    records: Vec<IncidentRecord>,
}

impl IncidentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, assigning its sequence number. Returns the stored record.
    pub fn append(&mut self, mut record: IncidentRecord) -> &IncidentRecord {
        debug_assert!(
            self.records.last().map_or(true, |last| last.timestamp <= record.timestamp),
            "ledger must stay time-ordered"
        );
        record.seq = self.records.len() as u64;
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Full ledger in insertion order. Call again to restart.
    pub fn all(&self) -> std::slice::Iter<'_, IncidentRecord> {
        self.records.iter()
    }

    /// Last `n` records, most recent first
    pub fn recent(&self, n: usize) -> Vec<IncidentRecord> {
        self.records.iter().rev().take(n).cloned().collect()
    }

    /// Records appended at or after position `from`
    pub fn since(&self, from: usize) -> &[IncidentRecord] {
        &self.records[from.min(self.records.len())..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IncidentRecord> {
        self.records.last()
    }

    pub fn count_by_class(&self, class: IncidentClass) -> usize {
        self.records.iter().filter(|r| r.class == class).count()
    }

    /// Per-class counts; classes without incidents are omitted
    pub fn summary(&self) -> BTreeMap<IncidentClass, u32> {
        let mut summary = BTreeMap::new();
        for record in &self.records {
            *summary.entry(record.class).or_insert(0) += 1;
        }
        summary
    }
}

impl<'a> IntoIterator for &'a IncidentLedger {
    type Item = &'a IncidentRecord;
    type IntoIter = std::slice::Iter<'a, IncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(class: IncidentClass, ms: i64) -> IncidentRecord {
        IncidentRecord::new(class, Utc.timestamp_millis_opt(ms).unwrap(), "test")
    }

    #[test]
    fn test_append_assigns_sequence() {
        let mut ledger = IncidentLedger::new();
        ledger.append(record(IncidentClass::NoFace, 0));
        let second = ledger.append(record(IncidentClass::PhoneDetected, 10)).clone();

        assert_eq!(second.seq, 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_recent_is_most_recent_first_and_pure() {
        let mut ledger = IncidentLedger::new();
        ledger.append(record(IncidentClass::NoFace, 0));
        ledger.append(record(IncidentClass::MultiFace, 10));
        ledger.append(record(IncidentClass::PhoneDetected, 20));

        let recent = ledger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].class, IncidentClass::PhoneDetected);
        assert_eq!(recent[1].class, IncidentClass::MultiFace);

        // Non-destructive
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.recent(10).len(), 3);
    }

    #[test]
    fn test_all_is_restartable() {
        let mut ledger = IncidentLedger::new();
        ledger.append(record(IncidentClass::NoFace, 0));
        ledger.append(record(IncidentClass::Absence, 5));

        let first: Vec<u64> = ledger.all().map(|r| r.seq).collect();
        let second: Vec<u64> = ledger.all().map(|r| r.seq).collect();
        assert_eq!(first, vec![0, 1]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_and_since() {
        let mut ledger = IncidentLedger::new();
        ledger.append(record(IncidentClass::NoFace, 0));
        ledger.append(record(IncidentClass::NoFace, 4_000));
        ledger.append(record(IncidentClass::PhoneDetected, 5_000));

        let summary = ledger.summary();
        assert_eq!(summary.get(&IncidentClass::NoFace), Some(&2));
        assert_eq!(summary.get(&IncidentClass::PhoneDetected), Some(&1));
        assert_eq!(summary.get(&IncidentClass::MultiFace), None);

        assert_eq!(ledger.since(2).len(), 1);
        assert!(ledger.since(99).is_empty());
        assert_eq!(ledger.count_by_class(IncidentClass::NoFace), 2);
    }
}
