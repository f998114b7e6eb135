//! Request-scoped state and the shared service bundle.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::LocaleConfig;
use crate::crypt::Cryptor;
use crate::i18n::Locale;
use crate::translations::TranslationLookup;
use crate::url_parts::RouteAttributes;

/// The locale serving the current request.
///
/// Set by the resolver, optionally overridden by the user's preference, and
/// read by handlers through request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLocale(Locale);

impl ActiveLocale {
    pub fn new(locale: Locale) -> Self {
        Self(locale)
    }

    pub fn get(&self) -> &Locale {
        &self.0
    }

    pub fn set(&mut self, locale: Locale) {
        self.0 = locale;
    }
}

/// Services shared by every request: configuration, translated routes and
/// the cookie cryptor.
#[derive(Clone)]
pub struct Localization {
    pub config: LocaleConfig,
    pub translations: Arc<dyn TranslationLookup>,
    pub cryptor: Arc<dyn Cryptor>,
}

impl Localization {
    pub fn new(
        config: LocaleConfig,
        translations: Arc<dyn TranslationLookup>,
        cryptor: Arc<dyn Cryptor>,
    ) -> Self {
        Self {
            config,
            translations,
            cryptor,
        }
    }
}

/// Logical route name attached to a route, e.g. `routes.about`.
///
/// Hosts tag routes with it via `Extension(RouteName(..))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteName(pub String);

/// Route name of a path shared by several locales, per declaring locale.
///
/// Attached where one registered path stands for different routes depending
/// on the active locale (`/about` may be `routes.about` in `en` and
/// `routes.team` in `de`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedRouteNames(pub IndexMap<Locale, String>);

impl LocalizedRouteNames {
    pub fn get(&self, locale: &Locale) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }
}

/// The route matched for the current request, as seen by the host router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentRoute {
    pub name: Option<String>,
    /// Matched path template (e.g., `/users/:id` or `/users/{id}`)
    pub uri: Option<String>,
    pub parameters: RouteAttributes,
}
