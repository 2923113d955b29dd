//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use attendance_core::{
    AttendanceError, AttendanceRecord, EmployeeHistory, RecordView, ReportTable, RosterEntry,
    UpsertOutcome,
    settings::{COMPANY_NAME_KEY, CURRENCY_KEY, WELCOME_TEXT_KEY},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body: `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// A register error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AttendanceError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AttendanceError::InvalidRecord(_)
            | AttendanceError::InvalidDate(_)
            | AttendanceError::InvalidBackup(_)
            | AttendanceError::InvalidSetting(_) => StatusCode::BAD_REQUEST,
            AttendanceError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::SerializationError(_) | AttendanceError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// A 404 for a missing employee or month.
    #[must_use]
    pub fn not_found(what: impl std::fmt::Display) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Not found: {}", what))),
        )
            .into_response()
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Query string of `GET /records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsQuery {
    #[serde(default)]
    pub view: RecordView,
}

/// Dashboard listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsResponse {
    pub view: RecordView,
    pub title: String,
    pub filename: String,
    pub count: usize,
    pub records: Vec<AttendanceRecord>,
}

/// Result of `POST /records`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    pub outcome: UpsertOutcome,
    pub record: AttendanceRecord,
}

/// Result of `DELETE /records/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

// =============================================================================
// EMPLOYEES
// =============================================================================

/// Query string of `GET /employees`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeesQuery {
    /// Partial name; when present only matching employees are listed.
    pub q: Option<String>,
}

/// Employee roster.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeesResponse {
    pub count: usize,
    pub employees: Vec<RosterEntry>,
}

/// Full history of one employee plus its exportable table.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeReportResponse {
    pub history: EmployeeHistory,
    pub report: ReportTable,
}

// =============================================================================
// BACKUP
// =============================================================================

/// Result of `POST /backup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub records: usize,
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Body of `PUT /settings`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsUpdate {
    pub welcome_text: Option<String>,
    pub company_name: Option<String>,
    pub currency: Option<String>,
}

impl SettingsUpdate {
    /// Requested changes as key/value pairs.
    #[must_use]
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        [
            (WELCOME_TEXT_KEY, self.welcome_text.as_deref()),
            (COMPANY_NAME_KEY, self.company_name.as_deref()),
            (CURRENCY_KEY, self.currency.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}
