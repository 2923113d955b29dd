//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the register's read lock; mutations take the write lock and
//! save the register before releasing it.

use super::{
    AppState, today,
    types::{
        ApiError, DeleteResponse, EmployeeReportResponse, EmployeesQuery, EmployeesResponse,
        ErrorResponse, HealthResponse, ImportResponse, RecordResponse, RecordsQuery, RecordsResponse,
        SettingsUpdate,
    },
};
use attendance_core::{
    AttendanceEntry, BackupDocument, RecordId, ReportTable, Settings, UpsertOutcome,
    employee_report, month_report, primitives::BACKUP_FILE_NAME, report_filename, views,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Month;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// RECORD HANDLERS
// =============================================================================

/// List records for a dashboard view.
pub async fn list_records_handler(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let register = state.register.read().await;
    let records = register.view(query.view, today())?;
    let title = query.view.title().to_string();

    Ok(Json(RecordsResponse {
        view: query.view,
        filename: report_filename(&title),
        title,
        count: records.len(),
        records,
    }))
}

/// Submit an attendance entry.
///
/// `201 Created` for a new record, `200 OK` when an existing one was
/// overwritten.
pub async fn submit_record_handler(
    State(state): State<AppState>,
    Json(entry): Json<AttendanceEntry>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let mut register = state.register.write().await;
    let (record, outcome) =
        state.apply(&mut register, |r| r.record_attendance(&entry, today()))?;

    let status = match outcome {
        UpsertOutcome::Inserted => StatusCode::CREATED,
        UpsertOutcome::Replaced => StatusCode::OK,
    };
    Ok((
        status,
        Json(RecordResponse {
            success: true,
            outcome,
            record,
        }),
    ))
}

/// Delete a record by id.
pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let mut register = state.register.write().await;
    state.apply(&mut register, |r| r.delete(&RecordId(id.clone())))?;

    Ok(Json(DeleteResponse { success: true, id }))
}

// =============================================================================
// EMPLOYEE HANDLERS
// =============================================================================

/// Employee roster, optionally filtered by a partial name.
pub async fn employees_handler(
    State(state): State<AppState>,
    Query(query): Query<EmployeesQuery>,
) -> Result<Json<EmployeesResponse>, ApiError> {
    let register = state.register.read().await;
    let mut employees = register.roster(today())?;

    if let Some(q) = query.q.as_deref() {
        let names: Vec<String> = employees.iter().map(|e| e.name.clone()).collect();
        let matches = views::name_suggestions(&names, q);
        employees.retain(|entry| matches.contains(&entry.name));
    }

    Ok(Json(EmployeesResponse {
        count: employees.len(),
        employees,
    }))
}

/// Grouped and summarized history of one employee.
pub async fn employee_report_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let register = state.register.read().await;
    let history = register.employee_history(&name)?;

    if history.is_empty() {
        return Ok(ApiError::not_found(format!("employee '{}'", name)));
    }

    let report = employee_report(&history);
    Ok(Json(EmployeeReportResponse { history, report }).into_response())
}

/// Single-month table of one employee.
///
/// `month` is a number (`1`-`12`) or an English month name.
pub async fn month_report_handler(
    State(state): State<AppState>,
    Path((name, year, month)): Path<(String, i32, String)>,
) -> Result<Response, ApiError> {
    let Some(month) = parse_month(&month) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid month '{}'", month))),
        )
            .into_response());
    };

    let register = state.register.read().await;
    let history = register.employee_history(&name)?;

    let table: Option<ReportTable> = history
        .month(year, month)
        .map(|group| month_report(&name, year, group));
    match table {
        Some(table) => Ok(Json(table).into_response()),
        None => Ok(ApiError::not_found(format!(
            "no records for '{}' in {} {}",
            name,
            month.name(),
            year
        ))),
    }
}

fn parse_month(value: &str) -> Option<Month> {
    match value.parse::<u8>() {
        Ok(number) => Month::try_from(number).ok(),
        Err(_) => value.parse::<Month>().ok(),
    }
}

// =============================================================================
// BACKUP HANDLERS
// =============================================================================

/// Download a full backup.
pub async fn export_backup_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let register = state.register.read().await;
    let document: BackupDocument = register.export_backup()?;

    let disposition = format!("attachment; filename=\"{}\"", BACKUP_FILE_NAME);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)))
}

/// Replace everything with an uploaded backup.
///
/// The raw body is validated as a whole; a rejected document changes
/// nothing.
pub async fn import_backup_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    let mut register = state.register.write().await;
    let records = state.apply(&mut register, |r| r.import_backup(&body))?;

    Ok(Json(ImportResponse {
        success: true,
        records,
    }))
}

// =============================================================================
// SETTINGS HANDLERS
// =============================================================================

/// Current settings.
pub async fn get_settings_handler(State(state): State<AppState>) -> Json<Settings> {
    let register = state.register.read().await;
    Json(register.settings().clone())
}

/// Update one or more settings.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<Settings>, ApiError> {
    let mut register = state.register.write().await;
    state.apply(&mut register, |r| r.update_settings(&update.changes()))?;

    Ok(Json(register.settings().clone()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_accepts_number_or_name() {
        assert_eq!(parse_month("1"), Some(Month::January));
        assert_eq!(parse_month("December"), Some(Month::December));
        assert_eq!(parse_month("13"), None);
        assert_eq!(parse_month("Smarch"), None);
    }
}
