//! # Settings
//!
//! Register-wide configuration: header text, organization name and the
//! currency used for new advances.
//!
//! Settings are loaded once when a register opens and written back on every
//! change (see [`crate::Register`]). Persistence goes through
//! [`crate::store::SettingsStore`].

use crate::AttendanceError;
use crate::primitives::{
    DEFAULT_COMPANY_NAME, DEFAULT_CURRENCY_SYMBOL, DEFAULT_WELCOME_TEXT, SUPPORTED_CURRENCIES,
};
use serde::{Deserialize, Serialize};

/// Storage key of the header text.
pub const WELCOME_TEXT_KEY: &str = "welcomeText";

/// Storage key of the organization name.
pub const COMPANY_NAME_KEY: &str = "companyName";

/// Storage key of the currency symbol.
pub const CURRENCY_KEY: &str = "currency";

/// Register settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub welcome_text: String,
    pub company_name: String,
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            currency: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl Settings {
    /// Look up a value by storage key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            WELCOME_TEXT_KEY => Some(&self.welcome_text),
            COMPANY_NAME_KEY => Some(&self.company_name),
            CURRENCY_KEY => Some(&self.currency),
            _ => None,
        }
    }

    /// Set a value by storage key, validating it first.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AttendanceError> {
        match key {
            WELCOME_TEXT_KEY => self.welcome_text = validate_text(key, value)?,
            COMPANY_NAME_KEY => self.company_name = validate_text(key, value)?,
            CURRENCY_KEY => self.currency = validate_currency(value)?,
            other => {
                return Err(AttendanceError::InvalidSetting(format!(
                    "Unknown setting '{}'. Use: {}, {}, {}",
                    other, WELCOME_TEXT_KEY, COMPANY_NAME_KEY, CURRENCY_KEY
                )));
            }
        }
        Ok(())
    }

    /// Key/value pairs in storage order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            (WELCOME_TEXT_KEY, &self.welcome_text),
            (COMPANY_NAME_KEY, &self.company_name),
            (CURRENCY_KEY, &self.currency),
        ]
    }
}

/// Reject empty header/company text.
pub fn validate_text(key: &str, value: &str) -> Result<String, AttendanceError> {
    if value.trim().is_empty() {
        return Err(AttendanceError::InvalidSetting(format!(
            "'{}' must not be empty",
            key
        )));
    }
    Ok(value.to_string())
}

/// Accept only the selectable currency symbols.
///
/// ISO codes are accepted too and mapped to their symbol.
pub fn validate_currency(value: &str) -> Result<String, AttendanceError> {
    let value = value.trim();
    SUPPORTED_CURRENCIES
        .iter()
        .find(|(symbol, code)| *symbol == value || code.eq_ignore_ascii_case(value))
        .map(|(symbol, _)| (*symbol).to_string())
        .ok_or_else(|| {
            let known: Vec<_> = SUPPORTED_CURRENCIES
                .iter()
                .map(|(symbol, code)| format!("{code} ({symbol})"))
                .collect();
            AttendanceError::InvalidSetting(format!(
                "Unsupported currency '{}'. Use one of: {}",
                value,
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_register_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.welcome_text, "Welcome");
        assert_eq!(settings.company_name, "UG Tech");
        assert_eq!(settings.currency, "$");
    }

    #[test]
    fn currency_accepts_symbol_or_code() {
        assert_eq!(validate_currency("€").expect("symbol"), "€");
        assert_eq!(validate_currency("inr").expect("code"), "₹");
        assert!(validate_currency("GBP").is_err());
    }

    #[test]
    fn set_rejects_empty_text_and_unknown_keys() {
        let mut settings = Settings::default();
        assert!(settings.set(COMPANY_NAME_KEY, "   ").is_err());
        assert!(settings.set("theme", "dark").is_err());

        settings.set(WELCOME_TEXT_KEY, "Hello").expect("set");
        assert_eq!(settings.get(WELCOME_TEXT_KEY), Some("Hello"));
    }
}
