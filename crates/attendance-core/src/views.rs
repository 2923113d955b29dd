//! # Record Views
//!
//! Dashboard listings derived from a record snapshot: the current month,
//! every record, advances only, and the employee roster.
//!
//! Like the aggregation engine these are pure functions of the snapshot and
//! a caller-supplied `today`.

use crate::AttendanceRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which records a dashboard listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordView {
    /// Records dated in the month of `today`.
    #[default]
    Current,
    /// Every record.
    All,
    /// Records carrying an advance.
    Advances,
}

impl RecordView {
    /// Report title for this listing.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            RecordView::Current => "Current Month Attendance",
            RecordView::All => "All Attendance Records",
            RecordView::Advances => "Advance Credit Records",
        }
    }

    /// Select the records of this listing, newest first.
    #[must_use]
    pub fn select(&self, records: &[AttendanceRecord], today: NaiveDate) -> Vec<AttendanceRecord> {
        match self {
            RecordView::Current => current_month(records, today),
            RecordView::All => all_records(records),
            RecordView::Advances => advances(records),
        }
    }
}

impl fmt::Display for RecordView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordView::Current => "current",
            RecordView::All => "all",
            RecordView::Advances => "advances",
        })
    }
}

impl FromStr for RecordView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(RecordView::Current),
            "all" => Ok(RecordView::All),
            "advances" => Ok(RecordView::Advances),
            other => Err(format!(
                "Unknown view '{}'. Use: current, all, advances",
                other
            )),
        }
    }
}

/// `YYYY-MM` prefix of the month containing `today`.
fn month_prefix(today: NaiveDate) -> String {
    today.format("%Y-%m").to_string()
}

fn newest_first(mut records: Vec<AttendanceRecord>) -> Vec<AttendanceRecord> {
    // ISO dates order lexically; stable for same-day records.
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}

/// Records dated in the month of `today`, newest first.
#[must_use]
pub fn current_month(records: &[AttendanceRecord], today: NaiveDate) -> Vec<AttendanceRecord> {
    let prefix = month_prefix(today);
    newest_first(
        records
            .iter()
            .filter(|record| record.date.starts_with(&prefix))
            .cloned()
            .collect(),
    )
}

/// Every record, newest first.
#[must_use]
pub fn all_records(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    newest_first(records.to_vec())
}

/// Records with `advanceCredit > 0`, newest first.
#[must_use]
pub fn advances(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    newest_first(
        records
            .iter()
            .filter(|record| record.has_advance())
            .cloned()
            .collect(),
    )
}

/// Employees who took an advance in the month of `today`, with the currency
/// symbol of their advance.
///
/// Records without a currency symbol are ignored. When an employee has
/// several advances the last one in snapshot order wins.
#[must_use]
pub fn employees_with_advance_in_month(
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> BTreeMap<String, String> {
    let prefix = month_prefix(today);
    let mut employees = BTreeMap::new();
    for record in records {
        if !record.date.starts_with(&prefix) || !record.has_advance() {
            continue;
        }
        if let Some(symbol) = &record.currency_symbol {
            employees.insert(record.name.clone(), symbol.clone());
        }
    }
    employees
}

/// Names containing `query`, case-insensitively. An empty query matches
/// nothing.
#[must_use]
pub fn name_suggestions<'a>(
    names: impl IntoIterator<Item = &'a String>,
    query: &str,
) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// One line of the employee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    /// Currency symbol when the employee took an advance this month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advance_symbol: Option<String>,
}

/// Sorted employee roster with the current-month advance marker.
#[must_use]
pub fn roster(
    names: &BTreeSet<String>,
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> Vec<RosterEntry> {
    let mut markers = employees_with_advance_in_month(records, today);
    names
        .iter()
        .map(|name| RosterEntry {
            name: name.clone(),
            advance_symbol: markers.remove(name),
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
    }

    fn sample() -> Vec<AttendanceRecord> {
        vec![
            AttendanceRecord::new("Alice", "2024-02-28", Status::Present),
            AttendanceRecord::new("Alice", "2024-03-01", Status::Late)
                .with_advance(Decimal::new(50, 0), "€"),
            AttendanceRecord::new("Bob", "2024-03-02", Status::Absent),
            {
                let mut r = AttendanceRecord::new("Carol", "2024-03-03", Status::Present);
                r.advance_credit = Some(Decimal::new(20, 0));
                r
            },
        ]
    }

    #[test]
    fn current_month_filters_and_orders() {
        let dates: Vec<_> = current_month(&sample(), today())
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec!["2024-03-03", "2024-03-02", "2024-03-01"]);
    }

    #[test]
    fn all_records_newest_first() {
        let records = all_records(&sample());
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].date, "2024-03-03");
        assert_eq!(records[3].date, "2024-02-28");
    }

    #[test]
    fn advances_only() {
        let names: Vec<_> = advances(&sample()).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Carol", "Alice"]);
    }

    #[test]
    fn advance_marker_ignores_missing_symbol() {
        let markers = employees_with_advance_in_month(&sample(), today());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers.get("Alice").map(String::as_str), Some("€"));
    }

    #[test]
    fn suggestions_are_case_insensitive() {
        let names: BTreeSet<String> = ["Alice", "Bob", "Malik"].iter().map(|s| s.to_string()).collect();
        assert_eq!(name_suggestions(&names, "LI"), vec!["Alice", "Malik"]);
        assert!(name_suggestions(&names, "").is_empty());
    }

    #[test]
    fn roster_marks_advances() {
        let records = sample();
        let names: BTreeSet<String> = records.iter().map(|r| r.name.clone()).collect();
        let roster = roster(&names, &records, today());

        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].advance_symbol.as_deref(), Some("€"));
        assert_eq!(roster[1].advance_symbol, None);
    }

    #[test]
    fn view_parses_and_titles() {
        assert_eq!("ADVANCES".parse::<RecordView>(), Ok(RecordView::Advances));
        assert!("weekly".parse::<RecordView>().is_err());
        assert_eq!(RecordView::All.title(), "All Attendance Records");
    }
}
