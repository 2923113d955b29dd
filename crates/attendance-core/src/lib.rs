//! # attendance-core
//!
//! Attendance register logic: the record model, the aggregation engine that
//! turns a flat record list into per-year, per-month summaries, and the
//! stores, settings, backups and report tables built around it.
//!
//! ## Architecture
//!
//! - `aggregation`: pure grouping and summaries (the core of the crate)
//! - `store` / `storage`: the record store contract, in-memory and redb backends
//! - `register`: the session object used by every outer surface
//! - `report` / `views`: dashboard listings and exportable tables
//!
//! The crate has no async and no network dependencies. Dates and "today"
//! are always passed in by the caller.

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregation;
pub mod entry;
pub mod formats;
pub mod primitives;
pub mod register;
pub mod report;
pub mod settings;
pub mod storage;
pub mod store;
pub mod types;
pub mod views;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Advance, AttendanceError, AttendanceRecord, RecordId, Status};

// =============================================================================
// RE-EXPORTS: Aggregation
// =============================================================================

pub use aggregation::{
    EmployeeHistory, MonthGroup, MonthSummaryEntry, MonthlySummary, YearGroup, YearSummary,
    employee_history, group_by_year_month, summarize,
};

// =============================================================================
// RE-EXPORTS: Storage and Register
// =============================================================================

pub use entry::{AttendanceEntry, NoPrediction, StatusPredictor};
pub use register::{Register, StorageBackend};
pub use settings::Settings;
pub use storage::RedbStore;
pub use store::{MemoryStore, RecordStore, SettingsStore, UpsertOutcome};

// =============================================================================
// RE-EXPORTS: Formats, Views and Reports
// =============================================================================

pub use formats::{BackupDocument, backup_from_bytes, backup_to_bytes};
pub use report::{
    ReportRow, ReportSection, ReportTable, dashboard_report, employee_report, month_report,
    render_text, report_filename,
};
pub use views::{RecordView, RosterEntry};
