//! # Aggregation Engine
//!
//! Pure transformations from a flat record snapshot to the nested
//! year → month → records view used by every report, plus the per-month
//! summaries shown next to each month.
//!
//! Ordering rules:
//! - Years descending (most recent first)
//! - Months within a year December → January
//! - Records within a month ascending by date
//!
//! Aggregation is total: a record whose date does not parse is skipped with
//! a diagnostic and never aborts the pass. The input snapshot is borrowed
//! and never mutated.

use crate::{Advance, AttendanceRecord, Status};
use chrono::{Datelike, Month, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// GROUPED OUTPUT
// =============================================================================

/// Records of one calendar month, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGroup {
    #[serde(serialize_with = "serialize_month")]
    pub month: Month,
    pub records: Vec<AttendanceRecord>,
}

impl MonthGroup {
    /// English month name ("January" … "December").
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.month.name()
    }

    /// Compute the summary for this month.
    #[must_use]
    pub fn summary(&self) -> MonthlySummary {
        MonthlySummary::from_records(&self.records)
    }
}

/// Months of one calendar year, December first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: i32,
    pub months: Vec<MonthGroup>,
}

impl YearGroup {
    /// Find a month within this year.
    #[must_use]
    pub fn month(&self, month: Month) -> Option<&MonthGroup> {
        self.months.iter().find(|group| group.month == month)
    }
}

fn serialize_month<S: Serializer>(month: &Month, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(month.name())
}

// =============================================================================
// SUMMARIES
// =============================================================================

/// Derived counts and advances for one (year, month). Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub advances: Vec<Advance>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_advance: Decimal,
}

impl MonthlySummary {
    /// Summarize a set of records.
    ///
    /// Every record with `advanceCredit > 0` contributes one advance, in
    /// input order.
    #[must_use]
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                Status::Present => summary.present += 1,
                Status::Absent => summary.absent += 1,
                Status::Late => summary.late += 1,
            }
            if let Some(advance) = record.advance() {
                summary.total_advance = summary.total_advance.saturating_add(advance.amount);
                summary.advances.push(advance);
            }
        }
        summary
    }

    /// Count for one status.
    #[must_use]
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Present => self.present,
            Status::Absent => self.absent,
            Status::Late => self.late,
        }
    }

    /// Total number of records summarized.
    #[must_use]
    pub fn total(&self) -> usize {
        self.present + self.absent + self.late
    }
}

/// Summary of one month, keyed by month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummaryEntry {
    #[serde(serialize_with = "serialize_month")]
    pub month: Month,
    pub summary: MonthlySummary,
}

/// Summaries of one year, in the same month order as the grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub months: Vec<MonthSummaryEntry>,
}

impl YearSummary {
    /// Find the summary of a month within this year.
    #[must_use]
    pub fn month(&self, month: Month) -> Option<&MonthlySummary> {
        self.months
            .iter()
            .find(|entry| entry.month == month)
            .map(|entry| &entry.summary)
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Group records by year, then month.
///
/// Records with an unparsable date contribute to no group; each one is
/// logged at `warn` level.
#[must_use]
pub fn group_by_year_month(records: &[AttendanceRecord]) -> Vec<YearGroup> {
    let mut grouped: BTreeMap<i32, BTreeMap<u32, Vec<(NaiveDate, &AttendanceRecord)>>> =
        BTreeMap::new();

    for record in records {
        let Some(date) = record.parsed_date() else {
            tracing::warn!(
                record_id = %record.id,
                date = %record.date,
                "Skipping record with invalid date"
            );
            continue;
        };
        grouped
            .entry(date.year())
            .or_default()
            .entry(date.month())
            .or_default()
            .push((date, record));
    }

    grouped
        .into_iter()
        .rev()
        .map(|(year, months)| YearGroup {
            year,
            months: months
                .into_iter()
                .rev()
                .filter_map(|(month, mut entries)| {
                    // Stable: same-day records keep snapshot order.
                    entries.sort_by_key(|(date, _)| *date);
                    let month = Month::try_from(month as u8).ok()?;
                    Some(MonthGroup {
                        month,
                        records: entries.into_iter().map(|(_, r)| r.clone()).collect(),
                    })
                })
                .collect(),
        })
        .collect()
}

/// Compute the monthly summary of every group.
#[must_use]
pub fn summarize(grouped: &[YearGroup]) -> Vec<YearSummary> {
    grouped
        .iter()
        .map(|year| YearSummary {
            year: year.year,
            months: year
                .months
                .iter()
                .map(|group| MonthSummaryEntry {
                    month: group.month,
                    summary: group.summary(),
                })
                .collect(),
        })
        .collect()
}

// =============================================================================
// EMPLOYEE HISTORY
// =============================================================================

/// Full grouped and summarized history of one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeHistory {
    pub name: String,
    pub years: Vec<YearGroup>,
    pub summaries: Vec<YearSummary>,
}

impl EmployeeHistory {
    /// Whether the employee has no aggregatable records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Find one month of the history.
    #[must_use]
    pub fn month(&self, year: i32, month: Month) -> Option<&MonthGroup> {
        self.years
            .iter()
            .find(|group| group.year == year)
            .and_then(|group| group.month(month))
    }
}

/// Build the history of one employee.
///
/// Matches on the exact name string; differently cased or spelled names are
/// different employees.
#[must_use]
pub fn employee_history(records: &[AttendanceRecord], name: &str) -> EmployeeHistory {
    let own: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| record.name == name)
        .cloned()
        .collect();
    let years = group_by_year_month(&own);
    let summaries = summarize(&years);
    EmployeeHistory {
        name: name.to_string(),
        years,
        summaries,
    }
}

// =============================================================================
// TESTS
// =============================================================================
