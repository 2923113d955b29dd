//! # Configuration
//!
//! Optional TOML configuration file.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! cors_origins = ["http://localhost:3000"]
//!
//! [storage]
//! database = "attendance.db"
//! backend = "redb"
//!
//! [logging]
//! format = "json"
//! filter = "attendance=debug"
//! ```
//!
//! Every key is optional. Precedence: CLI flag > config file > built-in
//! default.

use attendance_core::AttendanceError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default database path.
pub const DEFAULT_DATABASE: &str = "attendance.db";

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "attendance=info,attendance_core=info,tower_http=debug";

/// Maximum config file size (1 MB).
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

// =============================================================================
// STORAGE BACKEND KIND
// =============================================================================

/// Which storage backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The backup JSON document, rewritten after every change.
    File,
    /// redb embedded database.
    #[default]
    Redb,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::File => "file",
            BackendKind::Redb => "redb",
        })
    }
}

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[server]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Allowed CORS origins. Overridden by `ATTENDANCE_CORS_ORIGINS`.
    pub cors_origins: Option<Vec<String>>,
}

/// `[storage]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<BackendKind>,
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `text` or `json`. Overridden by `ATTENDANCE_LOG_FORMAT`.
    pub format: Option<String>,
    /// `EnvFilter` directive. Overridden by `RUST_LOG`.
    pub filter: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AttendanceError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            AttendanceError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(AttendanceError::InvalidSetting(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AttendanceError::IoError(format!("Read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, AttendanceError> {
        toml::from_str(content)
            .map_err(|e| AttendanceError::InvalidSetting(format!("Invalid config: {}", e)))
    }

    /// Load the file if a path was given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AttendanceError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the database path: flag, then file, then default.
    #[must_use]
    pub fn database(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.storage.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Resolve the storage backend: flag, then file, then default.
    #[must_use]
    pub fn backend(&self, flag: Option<BackendKind>) -> BackendKind {
        flag.or(self.storage.backend).unwrap_or_default()
    }

    /// Resolve the bind host: flag, then file, then default.
    #[must_use]
    pub fn host(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// Resolve the bind port: flag, then file, then default.
    #[must_use]
    pub fn port(&self, flag: Option<u16>) -> u16 {
        flag.or(self.server.port).unwrap_or(DEFAULT_PORT)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database(None), PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(config.backend(None), BackendKind::Redb);
        assert_eq!(config.port(None), DEFAULT_PORT);
    }

    #[test]
    fn file_values_apply_below_flags() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [storage]
            database = "team.json"
            backend = "file"
            "#,
        )
        .expect("parse");

        assert_eq!(config.host(None), "0.0.0.0");
        assert_eq!(config.port(None), 9000);
        assert_eq!(config.port(Some(7000)), 7000);
        assert_eq!(config.backend(None), BackendKind::File);
        assert_eq!(config.backend(Some(BackendKind::Redb)), BackendKind::Redb);
        assert_eq!(
            config.database(Some(PathBuf::from("other.db"))),
            PathBuf::from("other.db")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml("[server]\nhots = \"x\"").is_err());
        assert!(AppConfig::from_toml("[storage]\nbackend = \"sqlite\"").is_err());
    }

    #[test]
    fn logging_section_parses() {
        let config =
            AppConfig::from_toml("[logging]\nformat = \"json\"\nfilter = \"debug\"").expect("parse");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(AppConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
        assert_eq!(AppConfig::load(None).expect("default"), AppConfig::default());
    }
}
