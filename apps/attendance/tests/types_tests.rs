//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use attendance::api::{
    ApiError, ErrorResponse, HealthResponse, RecordsQuery, SettingsUpdate,
};
use attendance_core::{AttendanceError, RecordId, RecordView};
use axum::http::StatusCode;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_error_response_serialization() {
    let json = serde_json::to_string(&ErrorResponse::new("boom")).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
}

#[test]
fn test_validation_errors_are_bad_requests() {
    for err in [
        AttendanceError::InvalidRecord("name".to_string()),
        AttendanceError::InvalidDate("future".to_string()),
        AttendanceError::InvalidBackup("shape".to_string()),
        AttendanceError::InvalidSetting("currency".to_string()),
    ] {
        assert_eq!(ApiError(err).status_code(), StatusCode::BAD_REQUEST);
    }
}

#[test]
fn test_missing_record_is_not_found() {
    let err = ApiError::from(AttendanceError::RecordNotFound(RecordId::derive(
        "Ghost",
        "2024-01-01",
    )));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_storage_errors_are_server_errors() {
    assert_eq!(
        ApiError(AttendanceError::IoError("disk".to_string())).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        ApiError(AttendanceError::SerializationError("bytes".to_string())).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// QUERY TESTS
// =============================================================================

#[test]
fn test_records_query_defaults_to_current_month() {
    let query: RecordsQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(query.view, RecordView::Current);

    let query: RecordsQuery = serde_json::from_str(r#"{"view":"advances"}"#).unwrap();
    assert_eq!(query.view, RecordView::Advances);
}

// =============================================================================
// SETTINGS UPDATE TESTS
// =============================================================================

#[test]
fn test_settings_update_changes_skip_absent_fields() {
    let update: SettingsUpdate =
        serde_json::from_str(r#"{"companyName":"Acme","currency":"EUR"}"#).unwrap();

    assert_eq!(
        update.changes(),
        vec![("companyName", "Acme"), ("currency", "EUR")]
    );
}

#[test]
fn test_settings_update_rejects_unknown_keys() {
    let result: Result<SettingsUpdate, _> = serde_json::from_str(r#"{"welcome":"Hi"}"#);
    assert!(result.is_err());
}

#[test]
fn test_empty_settings_update_has_no_changes() {
    assert!(SettingsUpdate::default().changes().is_empty());
}
