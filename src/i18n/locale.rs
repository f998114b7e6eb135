//! Locale type: short language identifiers used as subdomain labels.
//!
//! A `Locale` is deliberately thin. Whether a locale may serve a request is
//! decided against the configured available list, not by this type.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// The implicit default locale. It is never used as a subdomain prefix.
pub const DEFAULT_LOCALE: &str = "en";

/// Error raised when a locale code is syntactically invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("locale code is empty")]
    Empty,
    #[error("malformed locale code: '{0}'")]
    Malformed(String),
}

/// A locale identifier such as `en`, `fr` or `pt-br`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

static LOCALE_REGEX: OnceLock<Regex> = OnceLock::new();

impl Locale {
    /// Wrap a raw code without validation.
    ///
    /// Values taken from requests (subdomains, `langSwitch`, cookies) go
    /// through here; they are only trusted after an availability check.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parse a locale code, rejecting anything that cannot be a subdomain label.
    ///
    /// # Arguments
    /// * `code` - The locale code (e.g., "en", "pt-br")
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is well formed
    /// * `Err(LocaleError)` otherwise
    pub fn parse(code: &str) -> Result<Self, LocaleError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LocaleError::Empty);
        }

        let regex = LOCALE_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap());
        if !regex.is_match(code) {
            return Err(LocaleError::Malformed(code.to_string()));
        }

        Ok(Self(code.to_string()))
    }

    /// The implicit default locale (`en`).
    pub fn default_locale() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the default locale, which gets no subdomain prefix.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LOCALE
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl PartialEq<str> for Locale {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Locale {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_simple_code() {
        let locale = Locale::parse("fr").expect("Should parse");
        assert_eq!(locale.as_str(), "fr");
    }

    #[test]
    fn test_parse_region_code() {
        assert!(Locale::parse("pt-br").is_ok());
        assert!(Locale::parse("zh-Hant").is_ok());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Locale::parse("  de ").unwrap(), "de");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Locale::parse(""), Err(LocaleError::Empty));
        assert_eq!(Locale::parse("   "), Err(LocaleError::Empty));
    }

    #[test]
    fn test_parse_rejects_non_label_characters() {
        assert!(matches!(Locale::parse("fr.ca"), Err(LocaleError::Malformed(_))));
        assert!(matches!(Locale::parse("f"), Err(LocaleError::Malformed(_))));
        assert!(matches!(Locale::parse("fr_FR"), Err(LocaleError::Malformed(_))));
        assert!(matches!(Locale::parse("en/us"), Err(LocaleError::Malformed(_))));
    }

    // ==================== Default Locale Tests ====================

    #[test]
    fn test_default_locale_is_english() {
        let locale = Locale::default_locale();
        assert_eq!(locale, "en");
        assert!(locale.is_default());
    }

    #[test]
    fn test_other_locales_are_not_default() {
        assert!(!Locale::new("fr").is_default());
        assert!(!Locale::new("").is_default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Locale::new("es").to_string(), "es");
    }
}
