//! # Register Module
//!
//! The attendance register: a storage backend plus the cached settings.
//!
//! The register is the single entry point used by the CLI and the HTTP API.
//! It owns the form rules (validate, merge, upsert), the settings lifecycle
//! (load on open, save on every set) and backup import/export.
//!
//! ## Storage Backends
//!
//! - `InMemory`: a [`MemoryStore`] (volatile unless the caller saves a backup)
//! - `Persistent`: a [`RedbStore`] for disk-backed ACID storage

use crate::aggregation::{EmployeeHistory, employee_history};
use crate::entry::{AttendanceEntry, StatusPredictor};
use crate::formats::{BackupDocument, backup_from_bytes};
use crate::settings::{COMPANY_NAME_KEY, CURRENCY_KEY, Settings, WELCOME_TEXT_KEY};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, RecordStore, SettingsStore, UpsertOutcome};
use crate::views::{self, RecordView, RosterEntry};
use crate::{AttendanceError, AttendanceRecord, RecordId, Status};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;

/// Storage backend for a Register.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn records(&self) -> &dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn records_mut(&mut self) -> &mut dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn replace_state(
        &mut self,
        records: Vec<AttendanceRecord>,
        settings: &Settings,
    ) -> Result<(), AttendanceError> {
        match self {
            Self::InMemory(store) => {
                store.replace_state(records, settings);
                Ok(())
            }
            Self::Persistent(store) => store.replace_state(&records, settings),
        }
    }
}

/// The attendance register.
///
/// Settings are read from the backend once, when the register is opened.
/// Every change is written back before the cached copy is updated, so a
/// failed save leaves the register unchanged.
#[derive(Debug, Default)]
pub struct Register {
    backend: StorageBackend,
    settings: Settings,
}

impl Register {
    /// Create an empty in-memory register with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a register over an existing in-memory store.
    #[must_use]
    pub fn with_memory(store: MemoryStore) -> Self {
        let settings = store.load_settings().unwrap_or_default();
        Self {
            backend: StorageBackend::InMemory(store),
            settings,
        }
    }

    /// Create a register with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, AttendanceError> {
        let store = RedbStore::open(path)?;
        let settings = store.load_settings()?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
            settings,
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Copy the records and settings into a new in-memory register.
    ///
    /// Changes to the copy never reach this register's backend.
    pub fn detached_copy(&self) -> Result<Self, AttendanceError> {
        Ok(Self::with_memory(MemoryStore::with_state(
            self.snapshot()?,
            self.settings.clone(),
        )))
    }

    /// Get the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Header text.
    #[must_use]
    pub fn welcome_text(&self) -> &str {
        &self.settings.welcome_text
    }

    /// Organization name.
    #[must_use]
    pub fn company_name(&self) -> &str {
        &self.settings.company_name
    }

    /// Currency symbol attached to new advances.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.settings.currency
    }

    pub fn set_welcome_text(&mut self, value: &str) -> Result<(), AttendanceError> {
        self.set_setting(WELCOME_TEXT_KEY, value)
    }

    pub fn set_company_name(&mut self, value: &str) -> Result<(), AttendanceError> {
        self.set_setting(COMPANY_NAME_KEY, value)
    }

    /// Set the currency. Accepts a supported symbol or its ISO code.
    pub fn set_currency(&mut self, value: &str) -> Result<(), AttendanceError> {
        self.set_setting(CURRENCY_KEY, value)
    }

    /// Set a setting by key, then persist.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), AttendanceError> {
        self.update_settings(&[(key, value)])
    }

    /// Apply several changes at once.
    ///
    /// All values are validated before anything is saved; one bad value
    /// rejects the whole update.
    pub fn update_settings(&mut self, changes: &[(&str, &str)]) -> Result<(), AttendanceError> {
        let mut next = self.settings.clone();
        for (key, value) in changes {
            next.set(key, value)?;
        }
        self.backend.settings_mut().save_settings(&next)?;
        for (key, _) in changes {
            tracing::debug!(key, "Setting saved");
        }
        self.settings = next;
        Ok(())
    }

    // =========================================================================
    // RECORDS
    // =========================================================================

    /// All records, in backend order.
    pub fn snapshot(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.backend.records().snapshot()
    }

    pub fn get(&self, id: &RecordId) -> Result<Option<AttendanceRecord>, AttendanceError> {
        self.backend.records().get(id)
    }

    pub fn record_count(&self) -> Result<usize, AttendanceError> {
        self.backend.records().len()
    }

    /// Distinct employee names, sorted.
    pub fn list_employees(&self) -> Result<BTreeSet<String>, AttendanceError> {
        self.backend.records().list_employees()
    }

    /// Submit a form entry.
    ///
    /// Validates against `today`, merges with the record already stored for
    /// the same employee and day, and upserts the result.
    pub fn record_attendance(
        &mut self,
        entry: &AttendanceEntry,
        today: NaiveDate,
    ) -> Result<(AttendanceRecord, UpsertOutcome), AttendanceError> {
        entry.validate(today)?;
        let existing = self.get(&entry.record_id())?;
        let record = entry.build_record(existing.as_ref(), &self.settings.currency);
        let outcome = self.backend.records_mut().upsert(record.clone())?;
        tracing::info!(id = %record.id, ?outcome, "Attendance recorded");
        Ok((record, outcome))
    }

    /// Delete a record by id.
    pub fn delete(&mut self, id: &RecordId) -> Result<(), AttendanceError> {
        if self.backend.records_mut().delete(id)? {
            tracing::info!(%id, "Record deleted");
            Ok(())
        } else {
            Err(AttendanceError::RecordNotFound(id.clone()))
        }
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Grouped and summarized history of one employee.
    pub fn employee_history(&self, name: &str) -> Result<EmployeeHistory, AttendanceError> {
        Ok(employee_history(&self.snapshot()?, name))
    }

    /// A dashboard listing.
    pub fn view(
        &self,
        view: RecordView,
        today: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(view.select(&self.snapshot()?, today))
    }

    /// Employee roster with the current-month advance marker.
    pub fn roster(&self, today: NaiveDate) -> Result<Vec<RosterEntry>, AttendanceError> {
        let records = self.snapshot()?;
        let names: BTreeSet<String> = records.iter().map(|r| r.name.clone()).collect();
        Ok(views::roster(&names, &records, today))
    }

    /// Employee names matching a partial query.
    pub fn suggest_names(&self, query: &str) -> Result<Vec<String>, AttendanceError> {
        Ok(views::name_suggestions(&self.list_employees()?, query))
    }

    /// Ask a predictor for the status of `name` on `date`.
    pub fn predict_status(
        &self,
        predictor: &dyn StatusPredictor,
        name: &str,
        date: NaiveDate,
    ) -> Result<Option<Status>, AttendanceError> {
        let history: Vec<AttendanceRecord> = self
            .snapshot()?
            .into_iter()
            .filter(|record| record.name == name)
            .collect();
        Ok(predictor.predict(name, date, &history))
    }

    // =========================================================================
    // BACKUP
    // =========================================================================

    /// Current state as a backup document.
    pub fn export_backup(&self) -> Result<BackupDocument, AttendanceError> {
        Ok(BackupDocument::new(self.snapshot()?, &self.settings))
    }

    /// Replace all records and settings with a backup.
    ///
    /// The document is fully validated before anything is written. Returns
    /// the number of records imported.
    pub fn import_backup(&mut self, bytes: &[u8]) -> Result<usize, AttendanceError> {
        let document = backup_from_bytes(bytes)?;
        self.restore(document)
    }

    /// Replace all records and settings with an already parsed backup.
    ///
    /// Records and settings are swapped together; on failure neither
    /// changes. Returns the number of records held afterwards, which is
    /// lower than the document's when it repeats an id.
    pub fn restore(&mut self, document: BackupDocument) -> Result<usize, AttendanceError> {
        let settings = document.settings(&self.settings);

        self.backend
            .replace_state(document.attendance_records, &settings)?;
        self.settings = settings;

        // A full replace leaves the old pages free
        if let StorageBackend::Persistent(store) = &mut self.backend {
            if let Err(e) = store.compact() {
                tracing::warn!(error = %e, "Compaction after import failed");
            }
        }

        let count = self.record_count()?;
        tracing::info!(records = count, "Backup imported");
        Ok(count)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::NoPrediction;
    use crate::formats::backup_to_bytes;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn record_then_overwrite() {
        let mut register = Register::new();
        let today = day(2024, 3, 10);

        let mut entry = AttendanceEntry::new("Bob", day(2024, 3, 1), Status::Present);
        entry.advance_credit = Some(Decimal::new(40, 0));
        let (_, first) = register.record_attendance(&entry, today).expect("record");

        let entry = AttendanceEntry::new("Bob", day(2024, 3, 1), Status::Late);
        let (record, second) = register.record_attendance(&entry, today).expect("record");

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Replaced);
        assert_eq!(register.record_count().expect("count"), 1);
        assert_eq!(record.status, Status::Late);
        assert_eq!(record.advance_credit, Some(Decimal::new(40, 0)));
    }

    #[test]
    fn invalid_entry_leaves_store_untouched() {
        let mut register = Register::new();
        let entry = AttendanceEntry::new("Bob", day(2030, 1, 1), Status::Present);

        assert!(register.record_attendance(&entry, day(2024, 3, 10)).is_err());
        assert_eq!(register.record_count().expect("count"), 0);
    }

    #[test]
    fn new_advance_uses_current_currency() {
        let mut register = Register::new();
        register.set_currency("PKR").expect("currency");

        let mut entry = AttendanceEntry::new("Bob", day(2024, 3, 1), Status::Present);
        entry.advance_credit = Some(Decimal::new(5, 0));
        let (record, _) = register
            .record_attendance(&entry, day(2024, 3, 10))
            .expect("record");

        assert_eq!(record.currency_symbol.as_deref(), Some("₨"));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut register = Register::new();
        let err = register
            .delete(&RecordId::derive("Ghost", "2024-01-01"))
            .expect_err("must fail");
        assert!(matches!(err, AttendanceError::RecordNotFound(_)));
    }

    #[test]
    fn rejected_setting_keeps_cache() {
        let mut register = Register::new();
        assert!(register.set_company_name("").is_err());
        assert_eq!(register.company_name(), "UG Tech");
        assert!(register.set_currency("GBP").is_err());
        assert_eq!(register.currency(), "$");
    }

    #[test]
    fn update_settings_is_all_or_nothing() {
        let mut register = Register::new();
        let result = register.update_settings(&[(COMPANY_NAME_KEY, "Acme"), (CURRENCY_KEY, "¥")]);

        assert!(result.is_err());
        assert_eq!(register.company_name(), "UG Tech");

        register
            .update_settings(&[(COMPANY_NAME_KEY, "Acme"), (CURRENCY_KEY, "INR")])
            .expect("update");
        assert_eq!(register.settings().currency, "₹");
    }

    #[test]
    fn settings_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("register.redb");

        {
            let mut register = Register::with_redb(&path).expect("open");
            register.set_company_name("Acme").expect("set");
            register.set_currency("€").expect("set");
        }

        let register = Register::with_redb(&path).expect("reopen");
        assert!(register.is_persistent());
        assert_eq!(register.company_name(), "Acme");
        assert_eq!(register.currency(), "€");
        assert_eq!(register.welcome_text(), "Welcome");
    }

    #[test]
    fn backup_round_trip_between_backends() {
        let mut source = Register::new();
        source.set_welcome_text("Hello").expect("set");
        let entry = AttendanceEntry::new("Alice", day(2024, 1, 5), Status::Present);
        source
            .record_attendance(&entry, day(2024, 3, 10))
            .expect("record");
        let bytes = backup_to_bytes(&source.export_backup().expect("export")).expect("bytes");

        let temp = tempdir().expect("temp dir");
        let mut target = Register::with_redb(temp.path().join("r.redb")).expect("open");
        let count = target.import_backup(&bytes).expect("import");

        assert_eq!(count, 1);
        assert_eq!(target.welcome_text(), "Hello");
        assert_eq!(target.snapshot().expect("snapshot"), source.snapshot().expect("snapshot"));
    }

    #[test]
    fn rejected_backup_changes_nothing() {
        let mut register = Register::new();
        let entry = AttendanceEntry::new("Alice", day(2024, 1, 5), Status::Present);
        register
            .record_attendance(&entry, day(2024, 3, 10))
            .expect("record");

        let bad = br#"{"attendanceRecords":"nope","welcomeText":"x","companyName":"y"}"#;
        assert!(register.import_backup(bad).is_err());
        assert_eq!(register.record_count().expect("count"), 1);
        assert_eq!(register.welcome_text(), "Welcome");
    }

    #[test]
    fn predictor_stub_returns_none() {
        let register = Register::new();
        let prediction = register
            .predict_status(&NoPrediction, "Alice", day(2024, 3, 1))
            .expect("predict");
        assert_eq!(prediction, None);
    }

    #[test]
    fn restore_counts_distinct_records() {
        let mut register = Register::new();
        let document = BackupDocument {
            attendance_records: vec![
                AttendanceRecord::new("Bob", "2024-03-01", Status::Present),
                AttendanceRecord::new("Bob", "2024-03-01", Status::Absent),
                AttendanceRecord::new("Bob", "2024-03-02", Status::Late),
            ],
            welcome_text: "Hi".to_string(),
            company_name: "Acme".to_string(),
            currency: None,
        };

        let count = register.restore(document).expect("restore");

        assert_eq!(count, 2);
        assert_eq!(register.record_count().expect("count"), 2);
    }

    #[test]
    fn restore_swaps_settings_with_records_on_redb() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("r.redb");

        {
            let mut register = Register::with_redb(&path).expect("open");
            let entry = AttendanceEntry::new("Old", day(2024, 1, 5), Status::Present);
            register
                .record_attendance(&entry, day(2024, 3, 10))
                .expect("record");

            let document = BackupDocument {
                attendance_records: vec![AttendanceRecord::new(
                    "New",
                    "2024-02-01",
                    Status::Late,
                )],
                welcome_text: "Hi".to_string(),
                company_name: "Acme".to_string(),
                currency: Some("€".to_string()),
            };
            assert_eq!(register.restore(document).expect("restore"), 1);
        }

        let register = Register::with_redb(&path).expect("reopen");
        assert_eq!(register.list_employees().expect("names").len(), 1);
        assert!(register.list_employees().expect("names").contains("New"));
        assert_eq!(register.welcome_text(), "Hi");
        assert_eq!(register.company_name(), "Acme");
        assert_eq!(register.currency(), "€");
    }

    #[test]
    fn detached_copy_leaves_original_untouched() {
        let register = Register::new();
        let mut copy = register.detached_copy().expect("copy");
        let entry = AttendanceEntry::new("Alice", day(2024, 1, 5), Status::Present);
        copy.record_attendance(&entry, day(2024, 3, 10))
            .expect("record");
        copy.set_company_name("Acme").expect("set");

        assert_eq!(register.record_count().expect("count"), 0);
        assert_ne!(register.company_name(), "Acme");
        assert_eq!(copy.record_count().expect("count"), 1);
    }
}
