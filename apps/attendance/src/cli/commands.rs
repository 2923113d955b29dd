//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::config::BackendKind;
use crate::storage::{open_register, read_backup_file, save_register, validate_output_path};
use attendance_core::{
    AttendanceEntry, AttendanceError, NoPrediction, RecordId, RecordView, Register, ReportTable,
    UpsertOutcome, backup_to_bytes, dashboard_report, employee_report, month_report,
    render_text,
};
use chrono::{Month, NaiveDate};
use std::path::{Path, PathBuf};

/// Where and how a command runs.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub database: PathBuf,
    pub backend: BackendKind,
    pub json_mode: bool,
}

impl CommandContext {
    fn open(&self) -> Result<Register, AttendanceError> {
        open_register(&self.database, self.backend)
    }

    fn save(&self, register: &Register) -> Result<(), AttendanceError> {
        save_register(register, &self.database)
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Write a rendered report as `<dir>/<report stem>.txt`.
///
/// The written file always sits directly inside `dir`.
fn export_text(table: &ReportTable, dir: &Path) -> Result<PathBuf, AttendanceError> {
    let filename = Path::new(&table.filename).with_extension("txt");
    let target = dir.canonicalize().map_err(|e| {
        AttendanceError::IoError(format!("Invalid export directory '{}': {}", dir.display(), e))
    })?;
    let output = validate_output_path(&target.join(filename))?;
    if output.parent() != Some(target.as_path()) {
        return Err(AttendanceError::IoError(format!(
            "Report file {:?} is outside the export directory",
            output
        )));
    }
    std::fs::write(&output, render_text(table))
        .map_err(|e| AttendanceError::IoError(format!("Write report: {}", e)))?;
    Ok(output)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    ctx: &CommandContext,
    addr: &str,
    cors_origins: &[String],
) -> Result<(), AttendanceError> {
    let register = ctx.open()?;

    println!("Attendance Register Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", addr);
    println!("  Backend:  {}", ctx.backend);
    println!("  Database: {:?}", ctx.database);
    println!();
    println!("Endpoints:");
    println!("  GET    /records                               - Dashboard listing");
    println!("  POST   /records                               - Record attendance");
    println!("  DELETE /records/{{id}}                          - Delete a record");
    println!("  GET    /employees                             - Employee roster");
    println!("  GET    /employees/{{name}}/report               - Employee report");
    println!("  GET    /employees/{{name}}/report/{{year}}/{{month}} - Month report");
    println!("  GET    /backup, POST /backup                  - Export / import");
    println!("  GET    /settings, PUT /settings               - Settings");
    println!("  GET    /health                                - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut state = AppState::new(register);
    if ctx.backend == BackendKind::File {
        state = state.with_save_path(ctx.database.clone());
    }
    api::run_server(addr, state, cors_origins).await
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

/// Record attendance for one employee and day.
pub fn cmd_record(
    ctx: &CommandContext,
    entry: &AttendanceEntry,
    today: NaiveDate,
) -> Result<(), AttendanceError> {
    let mut register = ctx.open()?;
    let (record, outcome) = register.record_attendance(entry, today)?;
    ctx.save(&register)?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "outcome": outcome,
            "record": record,
        }));
        return Ok(());
    }

    let verb = match outcome {
        UpsertOutcome::Inserted => "Recorded",
        UpsertOutcome::Replaced => "Updated",
    };
    println!("{} {}: {}", verb, record.id, record.status.label());
    if let Some(advance) = record.advance() {
        println!("  Advance: {}", advance);
    }
    Ok(())
}

/// Delete a record by id.
pub fn cmd_delete(ctx: &CommandContext, id: &str) -> Result<(), AttendanceError> {
    let mut register = ctx.open()?;
    register.delete(&RecordId(id.to_string()))?;
    ctx.save(&register)?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "success": true, "id": id }));
    } else {
        println!("Deleted {}", id);
    }
    Ok(())
}

// =============================================================================
// LISTING COMMANDS
// =============================================================================

/// Show a dashboard listing.
pub fn cmd_list(
    ctx: &CommandContext,
    view: RecordView,
    export: Option<&Path>,
) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let records = register.view(view, api::today())?;
    let table = dashboard_report(view, &records);

    if let Some(dir) = export {
        let output = export_text(&table, dir)?;
        println!("Exported {} records to {:?}", table.row_count(), output);
        return Ok(());
    }

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "view": view,
            "title": table.title,
            "filename": table.filename,
            "count": records.len(),
            "records": records,
        }));
        return Ok(());
    }

    print!("{}", render_text(&table));
    Ok(())
}

/// List employees, optionally filtered by a partial name.
pub fn cmd_employees(ctx: &CommandContext, search: Option<&str>) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let mut roster = register.roster(api::today())?;
    if let Some(query) = search {
        let matches = register.suggest_names(query)?;
        roster.retain(|entry| matches.contains(&entry.name));
    }

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "count": roster.len(),
            "employees": roster,
        }));
        return Ok(());
    }

    if roster.is_empty() {
        println!("No employees found");
        return Ok(());
    }
    println!("Employees ({})", roster.len());
    for entry in &roster {
        match &entry.advance_symbol {
            Some(symbol) => println!("  {}  [{}]", entry.name, symbol),
            None => println!("  {}", entry.name),
        }
    }
    Ok(())
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Show or export an employee report, whole history or one month.
pub fn cmd_report(
    ctx: &CommandContext,
    name: &str,
    month: Option<(i32, u8)>,
    export: Option<&Path>,
) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let history = register.employee_history(name)?;
    if history.is_empty() {
        return Err(AttendanceError::InvalidRecord(format!(
            "No records for employee '{}'",
            name
        )));
    }

    let table = match month {
        None => employee_report(&history),
        Some((year, number)) => {
            let month = Month::try_from(number)
                .map_err(|_| AttendanceError::InvalidDate(format!("Invalid month {}", number)))?;
            let group = history.month(year, month).ok_or_else(|| {
                AttendanceError::InvalidRecord(format!(
                    "No records for '{}' in {} {}",
                    name,
                    month.name(),
                    year
                ))
            })?;
            month_report(name, year, group)
        }
    };

    if let Some(dir) = export {
        let output = export_text(&table, dir)?;
        println!("Exported {} rows to {:?}", table.row_count(), output);
        return Ok(());
    }

    if ctx.json_mode {
        let report = serde_json::to_value(&table)
            .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
        print_json(&report);
        return Ok(());
    }

    print!("{}", render_text(&table));
    Ok(())
}

// =============================================================================
// BACKUP COMMANDS
// =============================================================================

/// Write every record and setting to a JSON file.
pub fn cmd_backup_export(ctx: &CommandContext, output: &Path) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let document = register.export_backup()?;
    let data = backup_to_bytes(&document)?;

    let validated_output = validate_output_path(output)?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| AttendanceError::IoError(format!("Write backup: {}", e)))?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "path": validated_output.to_string_lossy(),
            "records": document.attendance_records.len(),
            "bytes": data.len(),
        }));
    } else {
        println!(
            "Exported {} records ({} bytes) to {:?}",
            document.attendance_records.len(),
            data.len(),
            validated_output
        );
    }
    Ok(())
}

/// Replace every record and setting with a JSON backup.
pub fn cmd_backup_import(ctx: &CommandContext, input: &Path) -> Result<(), AttendanceError> {
    let data = read_backup_file(input)?;
    let mut register = ctx.open()?;
    let count = register.import_backup(&data)?;
    ctx.save(&register)?;

    if ctx.json_mode {
        print_json(&serde_json::json!({ "success": true, "records": count }));
    } else {
        println!("Imported {} records from {:?}", count, input);
    }
    Ok(())
}

// =============================================================================
// SETTINGS COMMANDS
// =============================================================================

/// Show current settings.
pub fn cmd_settings_show(ctx: &CommandContext) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let settings = register.settings();

    if ctx.json_mode {
        let value = serde_json::to_value(settings)
            .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
        print_json(&value);
        return Ok(());
    }

    for (key, value) in settings.entries() {
        println!("{:<12} {}", key, value);
    }
    Ok(())
}

/// Change one setting.
pub fn cmd_settings_set(
    ctx: &CommandContext,
    key: &str,
    value: &str,
) -> Result<(), AttendanceError> {
    let mut register = ctx.open()?;
    register.set_setting(key, value)?;
    ctx.save(&register)?;

    let stored = register.settings().get(key).unwrap_or_default();
    if ctx.json_mode {
        print_json(&serde_json::json!({ "success": true, "key": key, "value": stored }));
    } else {
        println!("{} = {}", key, stored);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(ctx: &CommandContext, force: bool) -> Result<(), AttendanceError> {
    if ctx.database.exists() {
        if !force {
            return Err(AttendanceError::IoError(format!(
                "Database already exists at {:?}. Use --force to overwrite.",
                ctx.database
            )));
        }
        std::fs::remove_file(&ctx.database)
            .map_err(|e| AttendanceError::IoError(format!("Remove db: {}", e)))?;
    }

    let register = ctx.open()?;
    ctx.save(&register)?;

    println!("Initialized new database at {:?}", ctx.database);
    println!("Backend: {}", ctx.backend);
    Ok(())
}

// =============================================================================
// PREDICT COMMAND
// =============================================================================

/// Suggest a status for an employee on a date.
pub fn cmd_predict(
    ctx: &CommandContext,
    name: &str,
    date: NaiveDate,
) -> Result<(), AttendanceError> {
    let register = ctx.open()?;
    let prediction = register.predict_status(&NoPrediction, name, date)?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "name": name,
            "date": date,
            "status": prediction,
        }));
        return Ok(());
    }

    match prediction {
        Some(status) => println!("{} on {}: {}", name, date, status.label()),
        None => println!("No prediction available for {} on {}", name, date),
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::Status;

    fn context(dir: &Path, backend: BackendKind) -> CommandContext {
        CommandContext {
            database: dir.join("register.db"),
            backend,
            json_mode: true,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn record_persists_for_file_backend() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ctx = context(temp.path(), BackendKind::File);

        let entry = AttendanceEntry::new("Alice", day(2024, 1, 5), Status::Late);
        cmd_record(&ctx, &entry, day(2024, 2, 1)).expect("record");

        let register = ctx.open().expect("open");
        assert_eq!(register.record_count().expect("count"), 1);
    }

    #[test]
    fn init_refuses_existing_database() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ctx = context(temp.path(), BackendKind::Redb);

        cmd_init(&ctx, false).expect("first init");
        assert!(cmd_init(&ctx, false).is_err());
        cmd_init(&ctx, true).expect("forced init");
    }

    #[test]
    fn report_export_writes_text_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ctx = context(temp.path(), BackendKind::Redb);

        let entry = AttendanceEntry::new("Alice Smith", day(2024, 1, 5), Status::Present);
        cmd_record(&ctx, &entry, day(2024, 2, 1)).expect("record");
        cmd_report(&ctx, "Alice Smith", Some((2024, 1)), Some(temp.path())).expect("report");

        let written = std::fs::read_dir(temp.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .any(|e| e.path().extension().is_some_and(|ext| ext == "txt"));
        assert!(written);
    }

    #[test]
    fn report_export_stays_inside_export_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ctx = context(temp.path(), BackendKind::Redb);
        let reports = temp.path().join("reports");
        std::fs::create_dir(&reports).expect("reports dir");

        for name in ["../escaped", "A/B Traders"] {
            let entry = AttendanceEntry::new(name, day(2024, 1, 5), Status::Present);
            cmd_record(&ctx, &entry, day(2024, 2, 1)).expect("record");
            cmd_report(&ctx, name, None, Some(&reports)).expect("export");
        }

        let mut written: Vec<String> = std::fs::read_dir(&reports)
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(
            written,
            vec![
                "___escaped_full_attendance_record.txt".to_string(),
                "a_b_traders_full_attendance_record.txt".to_string(),
            ]
        );
        assert!(!temp.path().join("escaped_full_attendance_record.txt").exists());
    }

    #[test]
    fn report_rejects_unknown_month() {
        let temp = tempfile::tempdir().expect("temp dir");
        let ctx = context(temp.path(), BackendKind::Redb);

        let entry = AttendanceEntry::new("Alice", day(2024, 1, 5), Status::Present);
        cmd_record(&ctx, &entry, day(2024, 2, 1)).expect("record");

        assert!(cmd_report(&ctx, "Alice", Some((2024, 13)), None).is_err());
        assert!(cmd_report(&ctx, "Alice", Some((2024, 2)), None).is_err());
        assert!(cmd_report(&ctx, "Nobody", None, None).is_err());
    }

    #[test]
    fn backup_export_then_import() {
        let temp = tempfile::tempdir().expect("temp dir");
        let source = context(temp.path(), BackendKind::Redb);
        let entry = AttendanceEntry::new("Bob", day(2024, 1, 5), Status::Absent);
        cmd_record(&source, &entry, day(2024, 2, 1)).expect("record");

        let backup = temp.path().join("backup.json");
        cmd_backup_export(&source, &backup).expect("export");

        let target = CommandContext {
            database: temp.path().join("copy.json"),
            backend: BackendKind::File,
            json_mode: false,
        };
        cmd_backup_import(&target, &backup).expect("import");
        assert_eq!(target.open().expect("open").record_count().expect("count"), 1);
    }
}
