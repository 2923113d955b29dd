//! # Attendance HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /records?view=current|all|advances` - Dashboard listing
//! - `POST /records` - Submit an attendance entry (upsert)
//! - `DELETE /records/{id}` - Delete a record
//! - `GET /employees?q=` - Employee roster with the current-month advance marker
//! - `GET /employees/{name}/report` - Full grouped history of one employee
//! - `GET /employees/{name}/report/{year}/{month}` - Single month table
//! - `GET /backup` / `POST /backup` - Export / import a full backup
//! - `GET /settings` / `PUT /settings` - Read / update settings
//!
//! ## Configuration (Environment Variables)
//!
//! - `ATTENDANCE_CORS_ORIGINS`: Comma-separated list of allowed origins, or
//!   "*" for all. Takes precedence over `[server] cors_origins`.

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `attendance::api::*`)
pub use handlers::{
    delete_record_handler, employee_report_handler, employees_handler, export_backup_handler,
    get_settings_handler, health_handler, import_backup_handler, list_records_handler,
    month_report_handler, submit_record_handler, update_settings_handler,
};
pub use types::{
    ApiError, DeleteResponse, EmployeeReportResponse, EmployeesQuery, EmployeesResponse,
    ErrorResponse, HealthResponse, ImportResponse, RecordResponse, RecordsQuery, RecordsResponse,
    SettingsUpdate,
};

use crate::storage::save_register;
use attendance_core::{AttendanceError, Register, primitives::MAX_BACKUP_SIZE};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit for everything but backup uploads (2 MB).
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Today's date on the local clock.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the register.
#[derive(Clone)]
pub struct AppState {
    /// The attendance register.
    pub register: Arc<RwLock<Register>>,
    /// File to rewrite after each change (file backend only).
    pub save_path: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Create new app state with a register.
    #[must_use]
    pub fn new(register: Register) -> Self {
        Self {
            register: Arc::new(RwLock::new(register)),
            save_path: None,
        }
    }

    /// Rewrite `path` after every successful mutation.
    #[must_use]
    pub fn with_save_path(mut self, path: PathBuf) -> Self {
        self.save_path = Some(Arc::new(path));
        self
    }

    /// Apply a change to the register, saving it if it is file-backed.
    ///
    /// A file-backed change runs on a copy that replaces the register only
    /// once the save succeeds.
    pub(crate) fn apply<T>(
        &self,
        register: &mut Register,
        change: impl FnOnce(&mut Register) -> Result<T, AttendanceError>,
    ) -> Result<T, AttendanceError> {
        let path = match &self.save_path {
            Some(path) if !register.is_persistent() => path,
            _ => return change(register),
        };

        let mut staged = register.detached_copy()?;
        let value = change(&mut staged)?;
        save_register(&staged, path)?;
        *register = staged;
        Ok(value)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment or config-file origins.
///
/// `ATTENDANCE_CORS_ORIGINS` wins over `configured`:
/// - If "*": allows all origins
/// - If neither is set: localhost only
/// - Otherwise: the listed origins
fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let origins_env = std::env::var("ATTENDANCE_CORS_ORIGINS").ok();
    let origins: Vec<String> = match origins_env.as_deref() {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => configured.to_vec(),
    };

    if origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        build_localhost_cors()
    } else {
        cors_with_origins(allowed_origins)
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    cors_with_origins(origins)
}

fn cors_with_origins(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with default CORS settings.
pub fn create_router(state: AppState) -> Router {
    create_router_with_origins(state, &[])
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - backup uploads get the backup size limit
pub fn create_router_with_origins(state: AppState, cors_origins: &[String]) -> Router {
    let cors = build_cors_layer(cors_origins);

    let backup = Router::new()
        .route(
            "/backup",
            get(handlers::export_backup_handler).post(handlers::import_backup_handler),
        )
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BACKUP_SIZE));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/records",
            get(handlers::list_records_handler).post(handlers::submit_record_handler),
        )
        .route(
            "/records/{id}",
            axum::routing::delete(handlers::delete_record_handler),
        )
        .route("/employees", get(handlers::employees_handler))
        .route(
            "/employees/{name}/report",
            get(handlers::employee_report_handler),
        )
        .route(
            "/employees/{name}/report/{year}/{month}",
            get(handlers::month_report_handler),
        )
        .route(
            "/settings",
            get(handlers::get_settings_handler).put(handlers::update_settings_handler),
        )
        .layer(axum::extract::DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .merge(backup)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    state: AppState,
    cors_origins: &[String],
) -> Result<(), AttendanceError> {
    let router = create_router_with_origins(state, cors_origins);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AttendanceError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Attendance HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AttendanceError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
