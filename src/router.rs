//! Locale-qualified URL building.
//!
//! `LocalizedRouter` rewrites routes onto locale subdomains
//! (`example.com/about` -> `fr.example.com/a-propos`) and finds the
//! equivalent of the current path in other locales' translated route tables.
//! It lives for one request: the parsed request URL and resolved route paths
//! are cached on first use and dropped with the router.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::LocaleConfig;
use crate::context::{ActiveLocale, CurrentRoute};
use crate::i18n::Locale;
use crate::request::RequestInfo;
use crate::translations::{dot, TranslationLookup};
use crate::url_parts::{substitute_attributes, RouteAttributes, UrlParts};

/// Translation namespace holding route paths.
pub const ROUTES_NAMESPACE: &str = "routes";

static COLON_PARAM: OnceLock<Regex> = OnceLock::new();

pub struct LocalizedRouter<'a, R: RequestInfo + ?Sized> {
    config: &'a LocaleConfig,
    translations: &'a dyn TranslationLookup,
    request: &'a R,
    route: CurrentRoute,
    locale: Locale,
    parsed_url: Option<UrlParts>,
    translated_routes: IndexMap<(Locale, String), Option<String>>,
}

impl<'a, R: RequestInfo + ?Sized> LocalizedRouter<'a, R> {
    pub fn new(
        config: &'a LocaleConfig,
        translations: &'a dyn TranslationLookup,
        request: &'a R,
        active: &ActiveLocale,
        route: CurrentRoute,
    ) -> Self {
        Self {
            config,
            translations,
            request,
            route,
            locale: active.get().clone(),
            parsed_url: None,
            translated_routes: IndexMap::new(),
        }
    }

    /// Build the URL of a translated route.
    ///
    /// # Arguments
    /// * `route_name` - Dotted translation key of the route (e.g., "routes.about")
    /// * `attributes` - Values for `{key}` / `{key?}` placeholders
    /// * `locale` - Target locale, the active locale when `None`
    /// * `add_lang_switch` - Append `langSwitch={locale}` to the query
    ///
    /// # Returns
    /// The URL, or `None` if the route has no translation for the locale.
    pub fn url(
        &mut self,
        route_name: &str,
        attributes: Option<&RouteAttributes>,
        locale: Option<&Locale>,
        add_lang_switch: bool,
    ) -> Option<String> {
        let locale = locale.cloned().unwrap_or_else(|| self.locale.clone());
        let template = self.resolve_in(route_name, &locale)?;

        let mut parts = self.current_url_parts().clone();
        if !locale.is_default() {
            parts.host = Some(self.localized_host(&locale));
        }
        parts.path = Some(substitute_attributes(&template, attributes));
        if add_lang_switch {
            parts.add_lang_switch(locale.as_str());
        }

        Some(parts.unparse())
    }

    /// URL of the current route in another locale.
    ///
    /// The default locale has no subdomain, so its URL carries `langSwitch`
    /// to override whatever the cookie or browser would pick.
    pub fn current(&mut self, locale: &Locale) -> Option<String> {
        let route_name = match self.route.name.clone() {
            Some(name) => name,
            None => {
                let uri = self.route.uri.clone()?;
                self.find_route_name_by_path(&uri)?
            }
        };

        let attributes: RouteAttributes = self
            .route
            .parameters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.url(&route_name, Some(&attributes), Some(locale), locale.is_default())
    }

    /// URLs of the current route for every available locale, in configured order.
    ///
    /// Locales whose URL cannot be built are left out.
    pub fn current_versions(&mut self, exclude_current_locale: bool) -> IndexMap<Locale, String> {
        let mut versions = IndexMap::new();

        for locale in self.config.available_locales.clone() {
            if exclude_current_locale && locale == self.locale {
                continue;
            }

            match self.current(&locale) {
                Some(url) if !url.is_empty() => {
                    versions.insert(locale, url);
                }
                _ => debug!("No {} version of the current route", locale),
            }
        }

        versions
    }

    /// Find the current path in another locale's translated routes.
    ///
    /// # Returns
    /// * `None` if the path is already a route of the active locale, or if no
    ///   other locale knows it
    /// * `Some(url)` for the first other locale (in configured order) whose
    ///   table has the exact path
    pub fn path_available_in_another_language(&mut self, namespace: &str) -> Option<String> {
        let (locale, route_name) = self.locate_path_in_other_locale(namespace)?;
        self.url(&route_name, None, Some(&locale), false)
    }

    /// Locale and dotted route name under which another locale serves the
    /// current path, unless the active locale serves it already.
    pub fn locate_path_in_other_locale(&self, namespace: &str) -> Option<(Locale, String)> {
        let uri = self.request.path();
        let serves = |routes: &[(String, String)]| {
            routes
                .iter()
                .find(|(_, path)| path.trim_start_matches('/') == uri)
                .map(|(name, _)| name.clone())
        };

        let current_routes = self
            .translations
            .get(namespace, &self.locale)
            .map(dot)
            .unwrap_or_default();
        if serves(&current_routes).is_some() {
            return None;
        }

        for locale in &self.config.available_locales {
            if *locale == self.locale {
                continue;
            }

            let routes = self.translations.get(namespace, locale).map(dot).unwrap_or_default();
            if let Some(route_name) = serves(&routes) {
                debug!("Path '/{}' is route '{}' in locale '{}'", uri, route_name, locale);
                return Some((locale.clone(), format!("{}.{}", namespace, route_name)));
            }
        }

        None
    }

    /// Path template of a route in the active locale, memoized per request.
    pub fn resolve(&mut self, route_name: &str) -> Option<String> {
        let locale = self.locale.clone();
        self.resolve_in(route_name, &locale)
    }

    /// Path template of a route in the given locale, memoized per request.
    pub fn resolve_in(&mut self, route_name: &str, locale: &Locale) -> Option<String> {
        let key = (locale.clone(), route_name.to_string());
        if let Some(cached) = self.translated_routes.get(&key) {
            return cached.clone();
        }

        let path = self.find_route_path_by_name(route_name, locale);
        self.translated_routes.insert(key, path.clone());
        path
    }

    /// The current request URL with its host set to `{active locale}.{domain}`.
    pub fn redirect_url(&self) -> Option<String> {
        let mut parts = UrlParts::parse(&self.request.full_url()?);
        if parts.is_empty() {
            return None;
        }
        parts.host = Some(self.localized_host(&self.locale));
        Some(parts.unparse())
    }

    /// Route name whose path template matches, searching resolved routes first
    /// and then the active locale's route table.
    pub fn find_route_name_by_path(&self, route_path: &str) -> Option<String> {
        let wanted = normalize_route_path(route_path);
        let matches = |path: &str| normalize_route_path(path) == wanted;

        let memoized = self
            .translated_routes
            .iter()
            .filter(|((locale, _), _)| *locale == self.locale)
            .find(|(_, path)| path.as_deref().is_some_and(matches))
            .map(|((_, name), _)| name.clone());
        if memoized.is_some() {
            return memoized;
        }

        self.translations
            .get(ROUTES_NAMESPACE, &self.locale)
            .map(dot)
            .unwrap_or_default()
            .into_iter()
            .find(|(_, path)| matches(path.as_str()))
            .map(|(name, _)| format!("{}.{}", ROUTES_NAMESPACE, name))
    }

    fn find_route_path_by_name(&self, route_name: &str, locale: &Locale) -> Option<String> {
        match self.translations.get(route_name, locale) {
            Some(Value::String(path)) => Some(path.clone()),
            Some(_) => {
                debug!("Translation '{}' for '{}' is not a route path", route_name, locale);
                None
            }
            None => {
                debug!("No translated route '{}' for '{}'", route_name, locale);
                None
            }
        }
    }

    /// Request URL components with the host reduced to the bare domain.
    fn current_url_parts(&mut self) -> &UrlParts {
        let request = self.request;
        let config = self.config;
        self.parsed_url.get_or_insert_with(|| {
            let mut parts = request
                .full_url()
                .map(|url| UrlParts::parse(&url))
                .unwrap_or_default();
            parts.host = Some(config.domain.clone());
            parts
        })
    }

    fn localized_host(&self, locale: &Locale) -> String {
        format!("{}.{}", locale, self.config.domain)
    }
}

/// Compare route templates regardless of leading slash or `:param` syntax.
fn normalize_route_path(path: &str) -> String {
    let colon = COLON_PARAM.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap());
    colon
        .replace_all(path.trim_start_matches('/'), "{$1}")
        .into_owned()
}
