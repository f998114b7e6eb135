//! Locale detection for the current request.
//!
//! Precedence, first available match wins:
//!
//! 1. the first label of the request host (`fr.example.com` -> `fr`)
//! 2. the `langSwitch` query parameter
//! 3. the encrypted locale cookie, when cookie localization is enabled
//! 4. the Accept-Language header, when browser localization is enabled
//! 5. the configured fallback locale, used without an availability check

use axum::http::Method;
use tracing::debug;

use crate::config::LocaleConfig;
use crate::context::ActiveLocale;
use crate::cookies::{forever_cookie, CookieWriter, LocaleCookie};
use crate::crypt::Cryptor;
use crate::i18n::Locale;
use crate::request::RequestInfo;
use crate::url_parts::LANG_SWITCH;

/// Where the resolved locale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    Url,
    LangSwitch,
    Cookie,
    Browser,
    Fallback,
}

/// Outcome of locale detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub locale: Locale,
    pub source: LocaleSource,
}

/// Decides the effective locale of a request and whether it must be redirected.
pub struct LocaleResolver<'a, R: RequestInfo + ?Sized> {
    config: &'a LocaleConfig,
    request: &'a R,
    cryptor: &'a dyn Cryptor,
}

impl<'a, R: RequestInfo + ?Sized> LocaleResolver<'a, R> {
    pub fn new(config: &'a LocaleConfig, request: &'a R, cryptor: &'a dyn Cryptor) -> Self {
        Self {
            config,
            request,
            cryptor,
        }
    }

    /// Detect the locale, make it active and persist it in the locale cookie.
    ///
    /// The cookie is only written when cookie localization is enabled and the
    /// chosen locale differs from the one the cookie currently holds.
    pub fn detect_locale(
        &self,
        active: &mut ActiveLocale,
        cookies: &mut dyn CookieWriter,
    ) -> Detection {
        let detection = self.resolve();
        debug!(
            "Resolved locale '{}' from {:?}",
            detection.locale, detection.source
        );

        self.set_locale(&detection.locale, active, cookies);
        detection
    }

    /// Run the precedence chain without side effects.
    pub fn resolve(&self) -> Detection {
        let available = |locale: &Locale| self.config.is_available(locale);

        let url_locale = self.url_locale();
        if available(&url_locale) {
            return Detection {
                locale: url_locale,
                source: LocaleSource::Url,
            };
        }

        if let Some(locale) = self.lang_switch_locale().filter(available) {
            return Detection {
                locale,
                source: LocaleSource::LangSwitch,
            };
        }

        if self.config.cookie_localization {
            if let Some(locale) = self.cookie_locale().filter(available) {
                return Detection {
                    locale,
                    source: LocaleSource::Cookie,
                };
            }
        }

        if self.config.browser_localization {
            if let Some(locale) = self.browser_locale().filter(available) {
                return Detection {
                    locale,
                    source: LocaleSource::Browser,
                };
            }
        }

        Detection {
            locale: self.config.fallback_locale.clone(),
            source: LocaleSource::Fallback,
        }
    }

    /// Whether the request should be bounced to the active locale's subdomain.
    ///
    /// Only GET requests that are not AJAX calls are redirected. The default
    /// locale never has a subdomain, so it never triggers a redirect.
    pub fn should_redirect(&self, active: &ActiveLocale) -> bool {
        if *self.request.method() != Method::GET || self.request.is_ajax() {
            return false;
        }

        let locale = active.get();
        !locale.is_default() && *locale != self.url_locale()
    }

    /// First dot-delimited label of the request host, empty without a host.
    pub fn url_locale(&self) -> Locale {
        let host = self.request.host().unwrap_or_default();
        Locale::new(host.split('.').next().unwrap_or_default())
    }

    pub fn lang_switch_locale(&self) -> Option<Locale> {
        self.request.query(LANG_SWITCH).map(Locale::new)
    }

    /// Locale stored in the cookie, if it decrypts and its version is current.
    pub fn cookie_locale(&self) -> Option<Locale> {
        let sealed = self.request.cookie(&self.config.cookie_name)?;
        LocaleCookie::open(self.cryptor, &sealed, &self.cookie_version())
    }

    pub fn browser_locale(&self) -> Option<Locale> {
        self.request
            .preferred_language(&self.config.available_locales)
    }

    fn cookie_version(&self) -> String {
        self.request
            .cookie(&self.config.cookie_version_name)
            .unwrap_or_default()
    }

    fn set_locale(
        &self,
        locale: &Locale,
        active: &mut ActiveLocale,
        cookies: &mut dyn CookieWriter,
    ) {
        active.set(locale.clone());

        if !self.config.cookie_localization {
            return;
        }
        if self.cookie_locale().as_ref() == Some(locale) {
            return;
        }

        debug!("Queueing locale cookie for '{}'", locale);
        let sealed = LocaleCookie::new(self.cookie_version(), locale.clone()).seal(self.cryptor);
        cookies.queue(forever_cookie(
            self.config.cookie_name.clone(),
            sealed,
            self.config.cookie_domain.clone(),
        ));
    }
}
