use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::i18n::Locale;

/// Locale resolution settings, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    // Locales
    pub available_locales: Vec<Locale>,
    pub fallback_locale: Locale,

    // Domain the locale subdomains hang off (e.g., "example.com")
    pub domain: String,

    // Cookie localization
    pub cookie_localization: bool,
    pub cookie_name: String,
    pub cookie_version_name: String,
    pub cookie_domain: Option<String>,

    // Browser localization
    pub browser_localization: bool,
}

impl LocaleConfig {
    pub fn from_env() -> Result<Self> {
        let available = std::env::var("AVAILABLE_LOCALES").context("AVAILABLE_LOCALES not set")?;

        let config = Self {
            available_locales: parse_locale_list(&available)?,
            fallback_locale: match std::env::var("FALLBACK_LOCALE") {
                Ok(code) => Locale::parse(&code).context("FALLBACK_LOCALE is invalid")?,
                Err(_) => Locale::default_locale(),
            },

            domain: std::env::var("LOCALIZATION_DOMAIN").context("LOCALIZATION_DOMAIN not set")?,

            cookie_localization: env_flag("COOKIE_LOCALIZATION", true)?,
            cookie_name: std::env::var("LOCALE_COOKIE_NAME")
                .unwrap_or_else(|_| "locale".to_string()),
            cookie_version_name: std::env::var("LOCALE_COOKIE_VERSION")
                .unwrap_or_else(|_| "locale_version".to_string()),
            cookie_domain: std::env::var("LOCALE_COOKIE_DOMAIN")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            browser_localization: env_flag("BROWSER_LOCALIZATION", true)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make resolution misbehave per request.
    ///
    /// A fallback outside the available list is allowed: it is the last
    /// resort and is used without an availability check.
    pub fn validate(&self) -> Result<()> {
        if self.available_locales.is_empty() {
            bail!("At least one available locale must be configured");
        }

        for locale in &self.available_locales {
            Locale::parse(locale.as_str())
                .with_context(|| format!("Invalid available locale '{}'", locale))?;
        }

        let domain = self.domain.trim();
        if domain.is_empty() || domain.contains('/') || domain.contains(':') {
            bail!("Localization domain must be a bare host name, got '{}'", self.domain);
        }

        if self.cookie_localization {
            if self.cookie_name.trim().is_empty() {
                bail!("Locale cookie name must not be empty when cookie localization is enabled");
            }
            if self.cookie_version_name.trim().is_empty() {
                bail!(
                    "Locale cookie version name must not be empty when cookie localization is enabled"
                );
            }
        }

        if !self.is_available(&self.fallback_locale) {
            warn!(
                "Fallback locale '{}' is not in the available locales {:?}; \
                 it will still be used as last resort",
                self.fallback_locale,
                self.available_locales.iter().map(Locale::as_str).collect::<Vec<_>>()
            );
        }

        Ok(())
    }

    /// Check whether a locale is in the configured allow-list.
    pub fn is_available(&self, locale: &Locale) -> bool {
        self.available_locales.contains(locale)
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub locale: LocaleConfig,

    // Secret used to seal the locale cookie
    pub app_key: String,

    // Directory holding `{locale}/{namespace}.json` route tables
    pub routes_dir: String,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let app_key = std::env::var("APP_KEY").context("APP_KEY not set")?;
        if app_key.len() < 16 {
            bail!("APP_KEY must be at least 16 characters long");
        }

        Ok(Self {
            locale: LocaleConfig::from_env()?,
            app_key,
            routes_dir: std::env::var("ROUTES_DIR").unwrap_or_else(|_| "lang".to_string()),
            port: std::env::var("PORT")
                .ok()
                .map(|v| v.parse::<u16>().context("PORT must be a valid port number"))
                .transpose()?
                .unwrap_or(8080),
        })
    }
}

fn parse_locale_list(raw: &str) -> Result<Vec<Locale>> {
    let mut locales: Vec<Locale> = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let locale = Locale::parse(code)
            .with_context(|| format!("Invalid locale '{}' in AVAILABLE_LOCALES", code))?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }
    Ok(locales)
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value).with_context(|| format!("{} must be a boolean", name)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("Unrecognised boolean value '{}'", other),
    }
}
