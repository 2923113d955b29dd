//! # Register Primitives
//!
//! Fixed constants for the attendance register.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Defaults for the settings service, the date format used for record ids
//! and grouping, and the input limits enforced at the boundaries.

/// ISO date format used for `AttendanceRecord::date` and record ids.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date format used in report rows (`dd-MM-yyyy`).
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Currency symbol used when an advance carries no symbol of its own.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Default header text.
pub const DEFAULT_WELCOME_TEXT: &str = "Welcome";

/// Default organization name.
pub const DEFAULT_COMPANY_NAME: &str = "UG Tech";

/// Currency symbols offered for selection, with their ISO codes.
pub const SUPPORTED_CURRENCIES: [(&str, &str); 4] =
    [("$", "USD"), ("₨", "PKR"), ("₹", "INR"), ("€", "EUR")];

/// Default file name for a full data backup.
pub const BACKUP_FILE_NAME: &str = "attendai_backup.json";

/// Extension of exported report documents.
pub const REPORT_EXTENSION: &str = "pdf";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Minimum length of an employee name on form submission.
pub const MIN_NAME_LENGTH: usize = 2;

/// Maximum length of an employee name.
///
/// Names longer than this are rejected at the entry boundary.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of the free-text notes field (64KB).
pub const MAX_NOTES_LENGTH: usize = 65536;

/// Earliest date accepted on form submission.
pub const EARLIEST_YEAR: i32 = 1900;

/// Maximum size of a backup document accepted for import (100 MB).
///
/// Checked before parsing to prevent memory exhaustion.
pub const MAX_BACKUP_SIZE: usize = 100 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_currency_is_supported() {
        assert!(
            SUPPORTED_CURRENCIES
                .iter()
                .any(|(symbol, _)| *symbol == DEFAULT_CURRENCY_SYMBOL)
        );
    }

    #[test]
    fn backup_file_name_is_json() {
        assert!(BACKUP_FILE_NAME.ends_with(".json"));
    }
}
