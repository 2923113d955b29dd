//! # Report Tables
//!
//! Render-ready report tables built from aggregation output and views.
//!
//! A [`ReportTable`] is what gets exported: a title, the file name derived
//! from it, column headers and one or more sections of numbered rows. Month
//! sections carry their [`MonthlySummary`].
//!
//! Renderings:
//! - [`render_text`]: fixed-width plain text
//! - JSON via `serde`

use crate::aggregation::{EmployeeHistory, MonthGroup, MonthlySummary};
use crate::primitives::{DISPLAY_DATE_FORMAT, REPORT_EXTENSION};
use crate::views::RecordView;
use crate::AttendanceRecord;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Columns of a per-employee month table.
pub const EMPLOYEE_COLUMNS: [&str; 8] = [
    "No.",
    "Day",
    "Date",
    "Status",
    "Arrival",
    "Departure",
    "Advance Credit",
    "Notes",
];

/// Columns of a dashboard table.
pub const DASHBOARD_COLUMNS: [&str; 8] = [
    "No.",
    "Date",
    "Name",
    "Status",
    "Arrival",
    "Departure",
    "Advance Credit",
    "Notes",
];

/// Placeholder for an empty cell.
const EMPTY_CELL: &str = "-";

// =============================================================================
// TABLE TYPES
// =============================================================================

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// 1-based position within the section.
    pub number: usize,
    /// Weekday initial, `-` when the date does not parse.
    pub day: String,
    /// Friday, the weekly rest day.
    pub weekend: bool,
    /// `dd-MM-yyyy`, or the raw stored date when it does not parse.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: String,
    pub arrival: String,
    pub departure: String,
    pub advance: String,
    pub notes: String,
}

impl ReportRow {
    fn from_record(number: usize, record: &AttendanceRecord, with_name: bool) -> Self {
        let parsed = record.parsed_date();
        Self {
            number,
            day: parsed.map_or_else(|| EMPTY_CELL.to_string(), day_initial),
            weekend: parsed.is_some_and(|date| date.weekday() == Weekday::Fri),
            date: parsed.map_or_else(
                || record.date.clone(),
                |date| date.format(DISPLAY_DATE_FORMAT).to_string(),
            ),
            name: with_name.then(|| record.name.clone()),
            status: record.status.label().to_string(),
            arrival: cell(record.arrival.as_deref()),
            departure: cell(record.departure.as_deref()),
            advance: advance_cell(record),
            notes: record.notes.clone(),
        }
    }

    /// Cells in the order of `columns`.
    fn cells(&self, columns: &[&str]) -> Vec<String> {
        columns
            .iter()
            .map(|column| match *column {
                "No." => self.number.to_string(),
                "Day" => self.day.clone(),
                "Date" => self.date.clone(),
                "Name" => self.name.clone().unwrap_or_default(),
                "Status" => self.status.clone(),
                "Arrival" => self.arrival.clone(),
                "Departure" => self.departure.clone(),
                "Advance Credit" => self.advance.clone(),
                "Notes" => self.notes.clone(),
                _ => String::new(),
            })
            .collect()
    }
}

/// A titled group of rows, optionally summarized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub rows: Vec<ReportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MonthlySummary>,
}

impl ReportSection {
    fn from_records(
        heading: Option<String>,
        records: &[AttendanceRecord],
        with_name: bool,
        summary: Option<MonthlySummary>,
    ) -> Self {
        Self {
            heading,
            rows: records
                .iter()
                .enumerate()
                .map(|(index, record)| ReportRow::from_record(index + 1, record, with_name))
                .collect(),
            summary,
        }
    }
}

/// An exportable report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub title: String,
    pub filename: String,
    pub columns: Vec<&'static str>,
    pub sections: Vec<ReportSection>,
}

impl ReportTable {
    fn new(title: String, columns: &[&'static str], sections: Vec<ReportSection>) -> Self {
        Self {
            filename: report_filename(&title),
            title,
            columns: columns.to_vec(),
            sections,
        }
    }

    /// Total rows across all sections.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|section| section.rows.len()).sum()
    }
}

// =============================================================================
// CELL FORMATTING
// =============================================================================

/// First letter of the English weekday name.
#[must_use]
pub fn day_initial(date: NaiveDate) -> String {
    // Weekday's Display yields "Mon", "Tue", ...
    date.weekday().to_string().chars().take(1).collect()
}

fn cell(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

fn advance_cell(record: &AttendanceRecord) -> String {
    match record.advance_credit {
        Some(amount) if !amount.is_zero() => {
            let symbol = record.currency_symbol.as_deref().unwrap_or_default();
            format!("{} {}", symbol, amount.normalize())
                .trim_start()
                .to_string()
        }
        _ => EMPTY_CELL.to_string(),
    }
}

/// Export file name for a report title.
///
/// Each run of whitespace becomes `_` (leading and trailing runs included),
/// the result is lowercased and the report extension appended. Path
/// separators, characters invalid in file names and leading dots also
/// become `_`, so the name never leaves the directory it is written to.
#[must_use]
pub fn report_filename(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if is_filename_safe(c) && !(c == '.' && stem.chars().all(|p| p == '_')) {
            stem.extend(c.to_lowercase());
        } else {
            stem.push('_');
        }
    }
    format!("{}.{}", stem, REPORT_EXTENSION)
}

fn is_filename_safe(c: char) -> bool {
    !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Heading of a month section, e.g. `"January 2024"`.
fn month_heading(group: &MonthGroup, year: i32) -> String {
    format!("{} {}", group.name(), year)
}

/// The single-month report of one employee.
#[must_use]
pub fn month_report(name: &str, year: i32, group: &MonthGroup) -> ReportTable {
    let title = format!("{} - {} {} Attendance", name, group.name(), year);
    let section = ReportSection::from_records(
        Some(month_heading(group, year)),
        &group.records,
        false,
        Some(group.summary()),
    );
    ReportTable::new(title, &EMPLOYEE_COLUMNS, vec![section])
}

/// The full record of one employee, one section per month.
#[must_use]
pub fn employee_report(history: &EmployeeHistory) -> ReportTable {
    let title = format!("{} Full Attendance Record", history.name);
    let sections = history
        .years
        .iter()
        .flat_map(|year| {
            year.months.iter().map(move |group| {
                ReportSection::from_records(
                    Some(month_heading(group, year.year)),
                    &group.records,
                    false,
                    Some(group.summary()),
                )
            })
        })
        .collect();
    ReportTable::new(title, &EMPLOYEE_COLUMNS, sections)
}

/// A dashboard listing as a single table with a Name column.
#[must_use]
pub fn dashboard_report(view: RecordView, records: &[AttendanceRecord]) -> ReportTable {
    let section = ReportSection::from_records(None, records, true, None);
    ReportTable::new(view.title().to_string(), &DASHBOARD_COLUMNS, vec![section])
}

// =============================================================================
// TEXT RENDERING
// =============================================================================

/// Render a report as fixed-width plain text.
///
/// Friday rows are marked with `*` after the day initial.
#[must_use]
pub fn render_text(table: &ReportTable) -> String {
    let mut out = String::new();
    push_line(&mut out, &table.title);
    push_line(&mut out, &"=".repeat(table.title.chars().count()));

    for section in &table.sections {
        out.push('\n');
        if let Some(heading) = &section.heading {
            push_line(&mut out, heading);
        }
        if let Some(summary) = &section.summary {
            push_line(&mut out, &summary_line(summary));
        }

        let rows: Vec<Vec<String>> = section
            .rows
            .iter()
            .map(|row| {
                let mut cells = row.cells(&table.columns);
                if row.weekend {
                    if let Some(index) = table.columns.iter().position(|c| *c == "Day") {
                        cells[index].push('*');
                    }
                }
                cells
            })
            .collect();

        let widths: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                rows.iter()
                    .map(|cells| cells[index].chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        let header: Vec<String> = table.columns.iter().map(|c| (*c).to_string()).collect();
        push_line(&mut out, &pad_line(&header, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &pad_line(&rule, &widths));
        if rows.is_empty() {
            push_line(&mut out, "(no records)");
        }
        for cells in &rows {
            push_line(&mut out, &pad_line(cells, &widths));
        }
    }
    out
}

fn summary_line(summary: &MonthlySummary) -> String {
    let mut line = format!(
        "Present: {}  Absent: {}  Late: {}",
        summary.present, summary.absent, summary.late
    );
    for advance in &summary.advances {
        line.push_str(&format!("  Advance: {}", advance));
    }
    line
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::employee_history;
    use crate::Status;
    use chrono::Month;
    use rust_decimal::Decimal;

    fn alice() -> Vec<AttendanceRecord> {
        vec![
            AttendanceRecord::new("Alice", "2024-01-05", Status::Present),
            AttendanceRecord::new("Alice", "2024-01-20", Status::Absent)
                .with_advance(Decimal::new(1000, 0), "₹"),
            AttendanceRecord::new("Alice", "2024-02-01", Status::Late),
        ]
    }

    #[test]
    fn filename_collapses_whitespace() {
        assert_eq!(
            report_filename("Alice  Smith - January 2024 Attendance"),
            "alice_smith_-_january_2024_attendance.pdf"
        );
        assert_eq!(
            report_filename("All Attendance Records"),
            "all_attendance_records.pdf"
        );
    }

    #[test]
    fn filename_keeps_edge_whitespace() {
        assert_eq!(
            report_filename(" Bob Full Attendance Record"),
            "_bob_full_attendance_record.pdf"
        );
    }

    #[test]
    fn filename_never_contains_path_components() {
        let escaped = report_filename("../escaped Full Attendance Record");
        assert_eq!(escaped, "___escaped_full_attendance_record.pdf");

        let traders = report_filename("A/B Traders Full Attendance Record");
        assert_eq!(traders, "a_b_traders_full_attendance_record.pdf");

        for name in [escaped, traders, report_filename("C:\\x\\..\\y")] {
            assert!(!name.contains('/') && !name.contains('\\'));
            assert!(!name.starts_with('.'));
        }
    }

    #[test]
    fn day_initials_and_friday() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
        assert_eq!(day_initial(friday), "F");

        let history = employee_history(&alice(), "Alice");
        let group = history.month(2024, Month::January).expect("january");
        let table = month_report("Alice", 2024, group);

        let rows = &table.sections[0].rows;
        assert!(rows[0].weekend);
        assert_eq!(rows[0].date, "05-01-2024");
        assert_eq!(rows[1].day, "S");
        assert!(!rows[1].weekend);
    }

    #[test]
    fn month_report_numbers_rows_from_one() {
        let history = employee_history(&alice(), "Alice");
        let group = history.month(2024, Month::January).expect("january");
        let table = month_report("Alice", 2024, group);

        assert_eq!(table.title, "Alice - January 2024 Attendance");
        assert_eq!(table.filename, "alice_-_january_2024_attendance.pdf");
        let numbers: Vec<_> = table.sections[0].rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(table.sections[0].rows[1].advance, "₹ 1000");
        assert_eq!(table.sections[0].rows[0].advance, "-");
        assert_eq!(table.sections[0].rows[0].arrival, "-");
    }

    #[test]
    fn employee_report_has_one_section_per_month() {
        let table = employee_report(&employee_history(&alice(), "Alice"));

        assert_eq!(table.title, "Alice Full Attendance Record");
        let headings: Vec<_> = table
            .sections
            .iter()
            .filter_map(|s| s.heading.as_deref())
            .collect();
        assert_eq!(headings, vec!["February 2024", "January 2024"]);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn dashboard_has_name_column() {
        let table = dashboard_report(RecordView::All, &alice());
        assert_eq!(table.columns[2], "Name");
        assert_eq!(table.sections[0].rows[0].name.as_deref(), Some("Alice"));
        assert!(table.sections[0].summary.is_none());
    }

    #[test]
    fn text_rendering_contains_summary_and_marker() {
        let history = employee_history(&alice(), "Alice");
        let group = history.month(2024, Month::January).expect("january");
        let text = render_text(&month_report("Alice", 2024, group));

        assert!(text.starts_with("Alice - January 2024 Attendance\n"));
        assert!(text.contains("Present: 1  Absent: 1  Late: 0  Advance: ₹ 1000"));
        assert!(text.contains("F*"));
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let text = render_text(&dashboard_report(RecordView::Advances, &[]));
        assert!(text.contains("(no records)"));
    }
}
