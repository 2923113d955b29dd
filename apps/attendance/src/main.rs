//! # Attendance Register
//!
//! The main binary for the attendance register.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for recording, reports and backups
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              apps/attendance (THE BINARY)        │
//! │                                                  │
//! │     ┌─────────────┐          ┌─────────────┐     │
//! │     │    CLI      │          │   HTTP API  │     │
//! │     │   (clap)    │          │   (axum)    │     │
//! │     └──────┬──────┘          └──────┬──────┘     │
//! │            └───────────┬────────────┘            │
//! │                        ▼                         │
//! │               ┌─────────────────┐                │
//! │               │ attendance-core │                │
//! │               └─────────────────┘                │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! attendance server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! attendance record -n "Alice Smith" -s late --arrival 09:40
//! attendance report -n "Alice Smith" -y 2024 -m 1 --export reports/
//! attendance backup export -o attendai_backup.json
//! ```

use attendance::{
    cli,
    config::{AppConfig, DEFAULT_LOG_FILTER, LoggingConfig},
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used with `--verbose` when `RUST_LOG` is not set.
const VERBOSE_LOG_FILTER: &str = "attendance=debug,attendance_core=debug,tower_http=debug";

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, &config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing.
///
/// `ATTENDANCE_LOG_FORMAT=json` (or `[logging] format = "json"`) enables
/// machine-parseable output. `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let log_format = std::env::var("ATTENDANCE_LOG_FORMAT")
        .ok()
        .or_else(|| logging.format.clone())
        .unwrap_or_else(|| "text".to_string());

    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            logging
                .filter
                .as_deref()
                .and_then(|f| EnvFilter::try_new(f).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(fallback));

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  Attendance Register v{}

  Daily attendance, advances and monthly reports
"#,
        env!("CARGO_PKG_VERSION")
    );
}
