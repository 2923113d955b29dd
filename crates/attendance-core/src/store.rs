//! # Record Store
//!
//! The store contract shared by every backend, and the in-memory store.
//!
//! The store is the only place records live. The aggregation engine never
//! talks to a store directly: callers take a `snapshot()` and hand it over.

use crate::settings::Settings;
use crate::{AttendanceError, AttendanceRecord, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// STORE TRAITS
// =============================================================================

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No record had this id; the store grew by one.
    Inserted,
    /// An existing record was overwritten; the store size is unchanged.
    Replaced,
}

/// Read/write surface over attendance records.
///
/// Implemented by the in-memory [`MemoryStore`] and the disk-backed
/// [`crate::storage::RedbStore`].
pub trait RecordStore {
    /// All records. No ordering guarantee.
    fn snapshot(&self) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Insert or overwrite by `record.id`.
    ///
    /// Afterwards there is exactly one record with that id.
    fn upsert(&mut self, record: AttendanceRecord) -> Result<UpsertOutcome, AttendanceError>;

    /// Remove a record. Returns `false` if no record had this id.
    fn delete(&mut self, id: &RecordId) -> Result<bool, AttendanceError>;

    /// Look up a single record.
    fn get(&self, id: &RecordId) -> Result<Option<AttendanceRecord>, AttendanceError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, AttendanceError>;

    /// Whether the store holds no records.
    fn is_empty(&self) -> Result<bool, AttendanceError> {
        Ok(self.len()? == 0)
    }

    /// Replace every record at once. Used by backup import.
    fn replace_all(&mut self, records: Vec<AttendanceRecord>) -> Result<(), AttendanceError>;

    /// Distinct employee names, sorted. Derived, never stored.
    fn list_employees(&self) -> Result<BTreeSet<String>, AttendanceError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .map(|record| record.name)
            .collect())
    }
}

/// Load/save surface for the register settings.
pub trait SettingsStore {
    /// Load settings, falling back to defaults for anything not stored.
    fn load_settings(&self) -> Result<Settings, AttendanceError>;

    /// Persist settings.
    fn save_settings(&mut self, settings: &Settings) -> Result<(), AttendanceError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory record store.
///
/// Keeps records in insertion order; an overwrite keeps the original slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<AttendanceRecord>,
    settings: Settings,
}

impl MemoryStore {
    /// Create an empty store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from existing records and settings.
    ///
    /// Later duplicates of an id overwrite earlier ones, so the at-most-one
    /// invariant holds even for hand-edited input.
    #[must_use]
    pub fn with_state(records: Vec<AttendanceRecord>, settings: Settings) -> Self {
        let mut store = Self {
            records: Vec::with_capacity(records.len()),
            settings,
        };
        store.fill(records);
        store
    }

    /// Borrow the records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Replace every record and the settings at once.
    pub fn replace_state(&mut self, records: Vec<AttendanceRecord>, settings: &Settings) {
        *self = Self::with_state(records, settings.clone());
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|record| &record.id == id)
    }

    fn fill(&mut self, records: Vec<AttendanceRecord>) {
        for record in records {
            match self.position(&record.id) {
                Some(index) => self.records[index] = record,
                None => self.records.push(record),
            }
        }
    }
}

impl RecordStore for MemoryStore {
    fn snapshot(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.records.clone())
    }

    fn upsert(&mut self, record: AttendanceRecord) -> Result<UpsertOutcome, AttendanceError> {
        match self.position(&record.id) {
            Some(index) => {
                self.records[index] = record;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                self.records.push(record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn delete(&mut self, id: &RecordId) -> Result<bool, AttendanceError> {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        Ok(self.records.len() != before)
    }

    fn get(&self, id: &RecordId) -> Result<Option<AttendanceRecord>, AttendanceError> {
        Ok(self.position(id).map(|index| self.records[index].clone()))
    }

    fn len(&self) -> Result<usize, AttendanceError> {
        Ok(self.records.len())
    }

    fn replace_all(&mut self, records: Vec<AttendanceRecord>) -> Result<(), AttendanceError> {
        self.records.clear();
        self.fill(records);
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn load_settings(&self) -> Result<Settings, AttendanceError> {
        Ok(self.settings.clone())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), AttendanceError> {
        self.settings = settings.clone();
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn upsert_same_day_replaces_in_place() {
        let mut store = MemoryStore::new();
        store
            .upsert(AttendanceRecord::new("Alice", "2024-03-01", Status::Present))
            .expect("upsert");
        let first = store
            .upsert(AttendanceRecord::new("Bob", "2024-03-01", Status::Present))
            .expect("upsert");
        let second = store
            .upsert(AttendanceRecord::new("Bob", "2024-03-01", Status::Late))
            .expect("upsert");

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Replaced);
        assert_eq!(store.len().expect("len"), 2);
        assert_eq!(store.records()[1].status, Status::Late);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut store = MemoryStore::new();
        store
            .upsert(AttendanceRecord::new("Alice", "2024-03-01", Status::Present))
            .expect("upsert");

        assert!(!store.delete(&RecordId::derive("Bob", "2024-03-01")).expect("delete"));
        assert!(store.delete(&RecordId::derive("Alice", "2024-03-01")).expect("delete"));
        assert!(store.is_empty().expect("empty"));
    }

    #[test]
    fn list_employees_is_distinct_and_sorted() {
        let mut store = MemoryStore::new();
        for (name, date) in [("Zed", "2024-01-01"), ("Amy", "2024-01-01"), ("Zed", "2024-01-02")] {
            store
                .upsert(AttendanceRecord::new(name, date, Status::Present))
                .expect("upsert");
        }

        let names: Vec<_> = store.list_employees().expect("list").into_iter().collect();
        assert_eq!(names, vec!["Amy".to_string(), "Zed".to_string()]);
    }

    #[test]
    fn with_state_collapses_duplicate_ids() {
        let records = vec![
            AttendanceRecord::new("Bob", "2024-03-01", Status::Present),
            AttendanceRecord::new("Bob", "2024-03-01", Status::Absent),
        ];
        let store = MemoryStore::with_state(records, Settings::default());

        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(store.records()[0].status, Status::Absent);
    }

    #[test]
    fn settings_round_trip() {
        let mut store = MemoryStore::new();
        let mut settings = store.load_settings().expect("load");
        settings.company_name = "Acme".to_string();

        store.save_settings(&settings).expect("save");

        assert_eq!(store.load_settings().expect("load").company_name, "Acme");
    }

    #[test]
    fn replace_state_swaps_records_and_settings() {
        let mut store = MemoryStore::new();
        store
            .upsert(AttendanceRecord::new("Old", "2020-01-01", Status::Absent))
            .expect("upsert");

        let settings = Settings {
            company_name: "Acme".to_string(),
            ..Settings::default()
        };
        store.replace_state(
            vec![
                AttendanceRecord::new("New", "2024-01-01", Status::Present),
                AttendanceRecord::new("New", "2024-01-01", Status::Late),
            ],
            &settings,
        );

        assert_eq!(store.len().expect("len"), 1);
        assert_eq!(store.records()[0].status, Status::Late);
        assert_eq!(store.load_settings().expect("load").company_name, "Acme");
    }
}
