//! # Backup Format
//!
//! The full-data backup document:
//!
//! ```json
//! {
//!   "attendanceRecords": [ ... ],
//!   "welcomeText": "Welcome",
//!   "companyName": "UG Tech",
//!   "currency": "$"
//! }
//! ```
//!
//! Import is all-or-nothing. The document is checked for size and shape
//! before any record is decoded, and a rejected document never yields a
//! partial result.

use crate::primitives::MAX_BACKUP_SIZE;
use crate::settings::{
    COMPANY_NAME_KEY, CURRENCY_KEY, Settings, WELCOME_TEXT_KEY, validate_currency,
};
use crate::{AttendanceError, AttendanceRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the record array in the backup document.
const RECORDS_KEY: &str = "attendanceRecords";

/// A complete backup: every record plus the register settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub attendance_records: Vec<AttendanceRecord>,
    pub welcome_text: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl BackupDocument {
    /// Build a backup from the current register state.
    #[must_use]
    pub fn new(records: Vec<AttendanceRecord>, settings: &Settings) -> Self {
        Self {
            attendance_records: records,
            welcome_text: settings.welcome_text.clone(),
            company_name: settings.company_name.clone(),
            currency: Some(settings.currency.clone()),
        }
    }

    /// Settings after applying this backup on top of `current`.
    ///
    /// The currency is only replaced when the backup carries one.
    #[must_use]
    pub fn settings(&self, current: &Settings) -> Settings {
        Settings {
            welcome_text: self.welcome_text.clone(),
            company_name: self.company_name.clone(),
            currency: self
                .currency
                .clone()
                .unwrap_or_else(|| current.currency.clone()),
        }
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a backup to pretty-printed JSON bytes.
pub fn backup_to_bytes(document: &BackupDocument) -> Result<Vec<u8>, AttendanceError> {
    serde_json::to_vec_pretty(document)
        .map_err(|e| AttendanceError::SerializationError(e.to_string()))
}

/// Parse and validate a backup document.
///
/// Rejects the document when:
/// - it exceeds [`MAX_BACKUP_SIZE`]
/// - it is not a JSON object
/// - `attendanceRecords` is missing or not an array
/// - `welcomeText` or `companyName` is missing or empty
/// - any record fails to decode
///
/// An unsupported `currency` is dropped, so the current one stays.
pub fn backup_from_bytes(bytes: &[u8]) -> Result<BackupDocument, AttendanceError> {
    if bytes.len() > MAX_BACKUP_SIZE {
        return Err(AttendanceError::InvalidBackup(format!(
            "Document too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_BACKUP_SIZE
        )));
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AttendanceError::InvalidBackup(format!("Not valid JSON: {}", e)))?;
    let Value::Object(mut object) = value else {
        return Err(AttendanceError::InvalidBackup(
            "Document must be a JSON object".to_string(),
        ));
    };

    let records = match object.remove(RECORDS_KEY) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(AttendanceError::InvalidBackup(format!(
                "'{}' must be an array",
                RECORDS_KEY
            )));
        }
        None => {
            return Err(AttendanceError::InvalidBackup(format!(
                "Missing '{}'",
                RECORDS_KEY
            )));
        }
    };

    let welcome_text = required_text(&object, WELCOME_TEXT_KEY)?;
    let company_name = required_text(&object, COMPANY_NAME_KEY)?;
    let currency = match object.get(CURRENCY_KEY) {
        Some(Value::String(symbol)) if !symbol.is_empty() => match validate_currency(symbol) {
            Ok(symbol) => Some(symbol),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unsupported backup currency");
                None
            }
        },
        _ => None,
    };

    let attendance_records = records
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<AttendanceRecord>(item).map_err(|e| {
                AttendanceError::InvalidBackup(format!("Record {}: {}", index, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BackupDocument {
        attendance_records,
        welcome_text,
        company_name,
        currency,
    })
}

fn required_text(object: &Map<String, Value>, key: &str) -> Result<String, AttendanceError> {
    match object.get(key) {
        Some(Value::String(text)) if !text.is_empty() => Ok(text.clone()),
        _ => Err(AttendanceError::InvalidBackup(format!(
            "'{}' must be a non-empty string",
            key
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
