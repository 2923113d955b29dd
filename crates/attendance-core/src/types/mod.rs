//! # Core Type Definitions
//!
//! This module contains the core types of the attendance register:
//! - Record identity (`RecordId`)
//! - Attendance status (`Status`)
//! - The persisted record (`AttendanceRecord`)
//! - Advance entries (`Advance`)
//! - Error types (`AttendanceError`)
//!
//! ## Wire Format
//!
//! Field names are camelCase on the wire, matching the persisted layout and
//! the backup document. Advance amounts are exact decimals in memory and
//! plain JSON numbers on the wire.

use crate::primitives::{DATE_FORMAT, DEFAULT_CURRENCY_SYMBOL};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// RECORD IDENTITY
// =============================================================================

/// Unique identifier of an attendance record.
///
/// Derived as `name + "-" + date`, so one employee has at most one record
/// per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Derive the id for an employee name and an ISO date string.
    #[must_use]
    pub fn derive(name: &str, date: &str) -> Self {
        Self(format!("{name}-{date}"))
    }

    /// Derive the id for an employee name and a calendar date.
    #[must_use]
    pub fn for_day(name: &str, date: NaiveDate) -> Self {
        Self::derive(name, &date.format(DATE_FORMAT).to_string())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Attendance status for one employee on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Present,
    Absent,
    Late,
}

impl Status {
    /// All statuses in display order.
    pub const ALL: [Status; 3] = [Status::Present, Status::Absent, Status::Late];

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
            Status::Late => "late",
        }
    }

    /// Capitalized label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
            Status::Late => "Late",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(Status::Present),
            "absent" => Ok(Status::Absent),
            "late" => Ok(Status::Late),
            other => Err(AttendanceError::InvalidRecord(format!(
                "Unknown status '{}'. Use: present, absent, late",
                other
            ))),
        }
    }
}

// =============================================================================
// ATTENDANCE RECORD
// =============================================================================

/// One attendance entry for one employee on one calendar day.
///
/// `date` is kept as the stored string. A record whose date does not parse
/// survives load/save untouched and is excluded at aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub name: String,
    pub date: String,
    pub status: Status,
    #[serde(default)]
    pub arrival: Option<String>,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub advance_credit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
}

impl AttendanceRecord {
    /// Create a record with no times, notes or advance.
    ///
    /// The id is derived from `name` and `date`.
    #[must_use]
    pub fn new(name: impl Into<String>, date: impl Into<String>, status: Status) -> Self {
        let name = name.into();
        let date = date.into();
        Self {
            id: RecordId::derive(&name, &date),
            name,
            date,
            status,
            arrival: None,
            departure: None,
            notes: String::new(),
            advance_credit: None,
            currency_symbol: None,
        }
    }

    /// Attach an advance to the record.
    #[must_use]
    pub fn with_advance(mut self, amount: Decimal, symbol: impl Into<String>) -> Self {
        self.advance_credit = Some(amount);
        self.currency_symbol = Some(symbol.into());
        self
    }

    /// Parse the stored date. Returns `None` for malformed dates.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Whether the record carries an advance (`advanceCredit > 0`).
    #[must_use]
    pub fn has_advance(&self) -> bool {
        self.advance_credit.is_some_and(|amount| amount > Decimal::ZERO)
    }

    /// The advance taken on this record, if any.
    ///
    /// Falls back to `$` when the record has no currency symbol.
    #[must_use]
    pub fn advance(&self) -> Option<Advance> {
        if !self.has_advance() {
            return None;
        }
        let amount = self.advance_credit?;
        let symbol = self
            .currency_symbol
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());
        Some(Advance { amount, symbol })
    }
}

// =============================================================================
// ADVANCE
// =============================================================================

/// A cash advance disbursed to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub symbol: String,
}

impl fmt::Display for Advance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.amount.normalize())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the attendance register.
///
/// Aggregation never returns one of these: malformed records are skipped
/// there. Everything that touches storage, settings or input validation
/// returns `Result<T, AttendanceError>`.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// A record or form entry failed validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A date string could not be parsed or is out of range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// A backup document was rejected as a whole.
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    /// A settings value was rejected.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or database error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
