//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database.
//!
//! - ACID transactions: every mutation is one write transaction
//! - Crash safety (copy-on-write B-trees)
//! - Settings live in their own table, one key per value
//!
//! Records are stored as JSON bytes keyed by record id, so the on-disk value
//! is exactly the persisted record layout.

use crate::settings::Settings;
use crate::store::{RecordStore, SettingsStore, UpsertOutcome};
use crate::{AttendanceError, AttendanceRecord, RecordId};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use std::path::Path;

/// Table for records: record id -> JSON bytes
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Table for settings: storage key -> value
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");

fn io_err(e: impl std::fmt::Display) -> AttendanceError {
    AttendanceError::IoError(e.to_string())
}

fn encode(record: &AttendanceRecord) -> Result<Vec<u8>, AttendanceError> {
    serde_json::to_vec(record).map_err(|e| AttendanceError::SerializationError(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<AttendanceRecord, AttendanceError> {
    serde_json::from_slice(bytes).map_err(|e| AttendanceError::SerializationError(e.to_string()))
}

fn encode_all(records: &[AttendanceRecord]) -> Result<Vec<(RecordId, Vec<u8>)>, AttendanceError> {
    records
        .iter()
        .map(|record| Ok((record.id.clone(), encode(record)?)))
        .collect()
}

/// Swap the records table contents inside an open write transaction.
fn write_records(
    write_txn: &WriteTransaction,
    encoded: &[(RecordId, Vec<u8>)],
) -> Result<(), AttendanceError> {
    let mut table = write_txn.open_table(RECORDS).map_err(io_err)?;

    let mut existing = Vec::new();
    for entry in table.iter().map_err(io_err)? {
        let (key, _) = entry.map_err(io_err)?;
        existing.push(key.value().to_string());
    }
    for key in &existing {
        table.remove(key.as_str()).map_err(io_err)?;
    }

    for (id, bytes) in encoded {
        table
            .insert(id.as_str(), bytes.as_slice())
            .map_err(io_err)?;
    }
    Ok(())
}

fn write_settings(write_txn: &WriteTransaction, settings: &Settings) -> Result<(), AttendanceError> {
    let mut table = write_txn.open_table(SETTINGS).map_err(io_err)?;
    for (key, value) in settings.entries() {
        table.insert(key, value).map_err(io_err)?;
    }
    Ok(())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AttendanceError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(RECORDS).map_err(io_err)?;
            let _ = write_txn.open_table(SETTINGS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Replace every record and the settings in one write transaction.
    ///
    /// A failure anywhere leaves both tables as they were.
    pub fn replace_state(
        &mut self,
        records: &[AttendanceRecord],
        settings: &Settings,
    ) -> Result<(), AttendanceError> {
        let encoded = encode_all(records)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        write_records(&write_txn, &encoded)?;
        write_settings(&write_txn, settings)?;
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    /// Compact the database.
    pub fn compact(&mut self) -> Result<(), AttendanceError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

// =============================================================================
// RECORDSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl RecordStore for RedbStore {
    fn snapshot(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn upsert(&mut self, record: AttendanceRecord) -> Result<UpsertOutcome, AttendanceError> {
        let bytes = encode(&record)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        let previous = {
            let mut table = write_txn.open_table(RECORDS).map_err(io_err)?;
            table
                .insert(record.id.as_str(), bytes.as_slice())
                .map_err(io_err)?
                .is_some()
        };
        write_txn.commit().map_err(io_err)?;

        Ok(if previous {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn delete(&mut self, id: &RecordId) -> Result<bool, AttendanceError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(RECORDS).map_err(io_err)?;
            table.remove(id.as_str()).map_err(io_err)?.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn get(&self, id: &RecordId) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;
        match table.get(id.as_str()).map_err(io_err)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn len(&self) -> Result<usize, AttendanceError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(RECORDS).map_err(io_err)?;
        Ok(table.len().map_err(io_err)? as usize)
    }

    /// Replace every record in a single transaction.
    ///
    /// Either the whole new set is committed or the old set stays.
    fn replace_all(&mut self, records: Vec<AttendanceRecord>) -> Result<(), AttendanceError> {
        let encoded = encode_all(&records)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        write_records(&write_txn, &encoded)?;
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}

// =============================================================================
// SETTINGSSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl SettingsStore for RedbStore {
    fn load_settings(&self) -> Result<Settings, AttendanceError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(io_err)?;

        let mut settings = Settings::default();
        for (key, _) in Settings::default().entries() {
            if let Some(value) = table.get(key).map_err(io_err)? {
                // Stored values were validated on the way in.
                let value = value.value().to_string();
                match key {
                    crate::settings::WELCOME_TEXT_KEY => settings.welcome_text = value,
                    crate::settings::COMPANY_NAME_KEY => settings.company_name = value,
                    _ => settings.currency = value,
                }
            }
        }
        Ok(settings)
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), AttendanceError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        write_settings(&write_txn, settings)?;
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Status;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let outcome = store
            .upsert(AttendanceRecord::new("Alice", "2024-01-05", Status::Present))
            .expect("upsert");
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(store.len().expect("len"), 1);

        let id = RecordId::derive("Alice", "2024-01-05");
        assert!(store.get(&id).expect("get").is_some());
        assert!(store.delete(&id).expect("delete"));
        assert!(!store.delete(&id).expect("delete"));
        assert!(store.is_empty().expect("empty"));
    }

    #[test]
    fn upsert_replaces_by_id() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        store
            .upsert(AttendanceRecord::new("Bob", "2024-03-01", Status::Present))
            .expect("upsert");
        let outcome = store
            .upsert(AttendanceRecord::new("Bob", "2024-03-01", Status::Late))
            .expect("upsert");

        assert_eq!(outcome, UpsertOutcome::Replaced);
        let records = store.snapshot().expect("snapshot");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Late);
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store
                .upsert(
                    AttendanceRecord::new("Alice", "2024-01-05", Status::Present)
                        .with_advance(Decimal::new(250, 0), "€"),
                )
                .expect("upsert");
            let mut settings = Settings::default();
            settings.company_name = "Acme".to_string();
            store.save_settings(&settings).expect("save");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        let records = store.snapshot().expect("snapshot");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].advance_credit, Some(Decimal::new(250, 0)));
        assert_eq!(store.load_settings().expect("load").company_name, "Acme");
    }

    #[test]
    fn fresh_database_has_default_settings() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        assert_eq!(store.load_settings().expect("load"), Settings::default());
    }

    #[test]
    fn replace_all_swaps_contents() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        store
            .upsert(AttendanceRecord::new("Old", "2020-01-01", Status::Absent))
            .expect("upsert");

        store
            .replace_all(vec![
                AttendanceRecord::new("New", "2024-01-01", Status::Present),
                AttendanceRecord::new("New", "2024-01-02", Status::Late),
            ])
            .expect("replace");

        let names = store.list_employees().expect("list");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["New".to_string()]);
        assert_eq!(store.len().expect("len"), 2);
    }

    #[test]
    fn compact_then_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            for day in 1..=28 {
                let date = format!("2024-02-{:02}", day);
                store
                    .upsert(AttendanceRecord::new("Alice", date, Status::Present))
                    .expect("upsert");
            }
            store.replace_all(Vec::new()).expect("clear");
            store
                .upsert(AttendanceRecord::new("Bob", "2024-03-01", Status::Late))
                .expect("upsert");
            store.compact().expect("compact");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.len().expect("len"), 1);
        assert!(
            store
                .get(&RecordId::derive("Bob", "2024-03-01"))
                .expect("get")
                .is_some()
        );
    }

    #[test]
    fn replace_state_swaps_records_and_settings_together() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store
                .upsert(AttendanceRecord::new("Old", "2020-01-01", Status::Absent))
                .expect("upsert");

            let settings = Settings {
                company_name: "Acme".to_string(),
                currency: "€".to_string(),
                ..Settings::default()
            };
            store
                .replace_state(
                    &[AttendanceRecord::new("New", "2024-01-01", Status::Present)],
                    &settings,
                )
                .expect("replace state");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.len().expect("len"), 1);
        assert!(
            store
                .get(&RecordId::derive("Old", "2020-01-01"))
                .expect("get")
                .is_none()
        );

        let settings = store.load_settings().expect("load");
        assert_eq!(settings.company_name, "Acme");
        assert_eq!(settings.currency, "€");
    }
}
