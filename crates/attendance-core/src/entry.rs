//! # Attendance Entry
//!
//! The add/edit form submission and the rules that turn it into a stored
//! record.
//!
//! An entry is validated against a caller-supplied `today`, so the rules are
//! deterministic and never read the system clock.

use crate::primitives::{
    DATE_FORMAT, EARLIEST_YEAR, MAX_NAME_LENGTH, MAX_NOTES_LENGTH, MIN_NAME_LENGTH,
};
use crate::{AttendanceError, AttendanceRecord, RecordId, Status};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub name: String,
    pub date: NaiveDate,
    pub status: Status,
    #[serde(default)]
    pub arrival: Option<String>,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub advance_credit: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl AttendanceEntry {
    /// Create an entry with no times, advance or notes.
    #[must_use]
    pub fn new(name: impl Into<String>, date: NaiveDate, status: Status) -> Self {
        Self {
            name: name.into(),
            date,
            status,
            arrival: None,
            departure: None,
            advance_credit: None,
            notes: String::new(),
        }
    }

    /// Id of the record this entry creates or overwrites.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        RecordId::for_day(self.name.trim(), self.date)
    }

    /// Check the form rules.
    pub fn validate(&self, today: NaiveDate) -> Result<(), AttendanceError> {
        let name_len = self.name.trim().chars().count();
        if name_len < MIN_NAME_LENGTH {
            return Err(AttendanceError::InvalidRecord(format!(
                "Name must be at least {} characters.",
                MIN_NAME_LENGTH
            )));
        }
        if name_len > MAX_NAME_LENGTH {
            return Err(AttendanceError::InvalidRecord(format!(
                "Name too long: {} characters (max: {})",
                name_len, MAX_NAME_LENGTH
            )));
        }
        if self.notes.len() > MAX_NOTES_LENGTH {
            return Err(AttendanceError::InvalidRecord(format!(
                "Notes too long: {} bytes (max: {})",
                self.notes.len(),
                MAX_NOTES_LENGTH
            )));
        }
        if self.advance_credit.is_some_and(|amount| amount < Decimal::ZERO) {
            return Err(AttendanceError::InvalidRecord(
                "Advance credit must not be negative".to_string(),
            ));
        }
        if self.date > today {
            return Err(AttendanceError::InvalidDate(format!(
                "{} is in the future",
                self.date
            )));
        }
        if self.date.year() < EARLIEST_YEAR {
            return Err(AttendanceError::InvalidDate(format!(
                "{} is before {}-01-01",
                self.date, EARLIEST_YEAR
            )));
        }
        Ok(())
    }

    /// Build the record to store.
    ///
    /// `existing` is the record currently stored under [`Self::record_id`],
    /// if any. `currency` is the symbol attached to a new advance.
    ///
    /// Merge rules on overwrite:
    /// - a non-zero advance replaces the old one and takes `currency`
    /// - a missing or zero advance keeps the old advance and its symbol
    #[must_use]
    pub fn build_record(
        &self,
        existing: Option<&AttendanceRecord>,
        currency: &str,
    ) -> AttendanceRecord {
        let date = self.date.format(DATE_FORMAT).to_string();
        let mut record = AttendanceRecord::new(self.name.trim(), date, self.status);
        record.arrival = non_empty(self.arrival.as_deref());
        record.departure = non_empty(self.departure.as_deref());
        record.notes = self.notes.clone();

        let new_advance = self.advance_credit.filter(|amount| !amount.is_zero());
        match (new_advance, existing) {
            (Some(amount), _) => {
                record.advance_credit = Some(amount);
                record.currency_symbol = Some(currency.to_string());
            }
            (None, Some(old)) => {
                record.advance_credit = old.advance_credit.filter(|amount| !amount.is_zero());
                record.currency_symbol = old.currency_symbol.clone();
            }
            (None, None) => {}
        }
        record
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// STATUS PREDICTION
// =============================================================================

/// Suggests a status for an employee from their past records.
pub trait StatusPredictor {
    /// Predict the status of `name` on `date`. `None` means no suggestion.
    fn predict(&self, name: &str, date: NaiveDate, history: &[AttendanceRecord])
    -> Option<Status>;
}

/// A predictor that never predicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrediction;

impl StatusPredictor for NoPrediction {
    fn predict(
        &self,
        _name: &str,
        _date: NaiveDate,
        _history: &[AttendanceRecord],
    ) -> Option<Status> {
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================
