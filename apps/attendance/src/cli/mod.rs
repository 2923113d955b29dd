//! # Attendance CLI Module
//!
//! This module implements the CLI interface for the attendance register.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `record` - Record attendance for one employee and day
//! - `delete` - Delete a record by id
//! - `list` - Show a dashboard listing (current, all, advances)
//! - `employees` - List employees
//! - `report` - Show or export an employee report
//! - `backup export|import` - Full data backup
//! - `settings show|set` - Register settings
//! - `init` - Initialize new database
//! - `predict` - Suggest a status for an employee

mod commands;

use crate::api::today;
use crate::config::{AppConfig, BackendKind};
use attendance_core::{
    AttendanceEntry, AttendanceError, RecordView, Status, primitives::BACKUP_FILE_NAME,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Attendance register
///
/// Records daily attendance and cash advances, and produces per-employee
/// monthly reports.
#[derive(Parser, Debug)]
#[command(name = "attendance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the register database [default: attendance.db]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend [default: redb]
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Record attendance (overwrites the same employee and day)
    Record {
        /// Employee name
        #[arg(short, long)]
        name: String,

        /// Date (YYYY-MM-DD) [default: today]
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// present, absent or late
        #[arg(short, long, default_value = "present")]
        status: Status,

        /// Arrival time
        #[arg(long)]
        arrival: Option<String>,

        /// Departure time
        #[arg(long)]
        departure: Option<String>,

        /// Cash advance taken on this day
        #[arg(long)]
        advance: Option<Decimal>,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Delete a record by id (NAME-YYYY-MM-DD)
    Delete {
        /// Record id
        id: String,
    },

    /// Show a dashboard listing
    List {
        /// current, all or advances
        #[arg(short = 'w', long, default_value = "current")]
        view: RecordView,

        /// Write the text report into this directory
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// List employees
    Employees {
        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show or export an employee report
    Report {
        /// Employee name (exact)
        #[arg(short, long)]
        name: String,

        /// Year of a single-month report (requires --month)
        #[arg(short, long, requires = "month")]
        year: Option<i32>,

        /// Month (1-12) of a single-month report (requires --year)
        #[arg(short, long, requires = "year")]
        month: Option<u8>,

        /// Write the text report into this directory
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Full data backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Suggest a status for an employee
    Predict {
        /// Employee name
        #[arg(short, long)]
        name: String,

        /// Date (YYYY-MM-DD) [default: today]
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

/// Backup subcommands.
#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// Write every record and setting to a JSON file
    Export {
        /// Output file path
        #[arg(short, long, default_value = BACKUP_FILE_NAME)]
        output: PathBuf,
    },

    /// Replace every record and setting with a JSON backup
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Settings subcommands.
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Change one setting (welcomeText, companyName, currency)
    Set { key: String, value: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: &AppConfig) -> Result<(), AttendanceError> {
    let ctx = CommandContext {
        database: config.database(cli.database),
        backend: config.backend(cli.backend),
        json_mode: cli.json_mode,
    };

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let addr = format!("{}:{}", config.host(host), config.port(port));
            let origins = config.server.cors_origins.clone().unwrap_or_default();
            cmd_server(&ctx, &addr, &origins).await
        }
        Some(Commands::Record {
            name,
            date,
            status,
            arrival,
            departure,
            advance,
            notes,
        }) => {
            let today = today();
            let mut entry = AttendanceEntry::new(name, date.unwrap_or(today), status);
            entry.arrival = arrival;
            entry.departure = departure;
            entry.advance_credit = advance;
            entry.notes = notes;
            cmd_record(&ctx, &entry, today)
        }
        Some(Commands::Delete { id }) => cmd_delete(&ctx, &id),
        Some(Commands::List { view, export }) => cmd_list(&ctx, view, export.as_deref()),
        Some(Commands::Employees { search }) => cmd_employees(&ctx, search.as_deref()),
        Some(Commands::Report {
            name,
            year,
            month,
            export,
        }) => cmd_report(&ctx, &name, year.zip(month), export.as_deref()),
        Some(Commands::Backup { action }) => match action {
            BackupAction::Export { output } => cmd_backup_export(&ctx, &output),
            BackupAction::Import { input } => cmd_backup_import(&ctx, &input),
        },
        Some(Commands::Settings { action }) => match action {
            None | Some(SettingsAction::Show) => cmd_settings_show(&ctx),
            Some(SettingsAction::Set { key, value }) => cmd_settings_set(&ctx, &key, &value),
        },
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Predict { name, date }) => {
            cmd_predict(&ctx, &name, date.unwrap_or_else(today))
        }
        None => {
            // No subcommand - show this month by default
            cmd_list(&ctx, RecordView::Current, None)
        }
    }
}
