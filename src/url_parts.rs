//! Decomposed URLs and their reassembly.
//!
//! Every component is optional; reassembly only emits what is present.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use url::Url;

/// Query parameter that forces a locale without a subdomain.
pub const LANG_SWITCH: &str = "langSwitch";

/// Route parameters substituted into `{name}` / `{name?}` placeholders.
pub type RouteAttributes = IndexMap<String, String>;

/// A URL split into its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

static OPTIONAL_SEGMENT: OnceLock<Regex> = OnceLock::new();

impl UrlParts {
    /// Split an absolute URL. Unparseable input yields empty parts.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) => Self::from(&url),
            Err(_) => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reassemble the components into a URL string.
    ///
    /// The path gets a leading slash only when something precedes it.
    pub fn unparse(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut url = String::new();
        if let Some(scheme) = &self.scheme {
            url.push_str(scheme);
            url.push_str("://");
        }
        if let Some(host) = &self.host {
            // Credentials only make sense in front of a host
            let user = self.user.as_deref().unwrap_or("");
            let pass = self.pass.as_deref().map(|p| format!(":{}", p)).unwrap_or_default();
            if !user.is_empty() || !pass.is_empty() {
                url.push_str(user);
                url.push_str(&pass);
                url.push('@');
            }
            url.push_str(host);
        }
        if let Some(port) = self.port {
            url.push(':');
            url.push_str(&port.to_string());
        }

        if let Some(path) = &self.path {
            if url.is_empty() {
                url.push_str(path);
            } else {
                url.push('/');
                url.push_str(path.trim_start_matches('/'));
            }
        }

        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            url.push('#');
            url.push_str(fragment);
        }

        url
    }

    /// Add `langSwitch={locale}` to the query unless the key is already there.
    pub fn add_lang_switch(&mut self, locale: &str) {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => {
                let present = url::form_urlencoded::parse(query.as_bytes())
                    .any(|(key, _)| key == LANG_SWITCH);
                if !present {
                    self.query = Some(format!("{}&{}={}", query, LANG_SWITCH, locale));
                }
            }
            _ => self.query = Some(format!("{}={}", LANG_SWITCH, locale)),
        }
    }
}

impl From<&Url> for UrlParts {
    fn from(url: &Url) -> Self {
        Self {
            scheme: Some(url.scheme().to_string()),
            host: url.host_str().map(str::to_string),
            port: url.port(),
            user: Some(url.username())
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            pass: url.password().map(str::to_string),
            path: Some(url.path().to_string()),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        }
    }
}

/// Fill route placeholders and drop optional segments left unfilled.
///
/// `{key}` and `{key?}` are replaced by the attribute value. A path segment
/// that is nothing but an unfilled `{name?}` is removed; unfilled required
/// placeholders stay as literal text.
pub fn substitute_attributes(template: &str, attributes: Option<&RouteAttributes>) -> String {
    let mut route = template.to_string();
    if let Some(attributes) = attributes {
        for (key, value) in attributes {
            route = route.replace(&format!("{{{}}}", key), value);
            route = route.replace(&format!("{{{}?}}", key), value);
        }
    }

    let optional = OPTIONAL_SEGMENT.get_or_init(|| Regex::new(r"^\{[^/{}]+\?\}$").unwrap());
    route
        .split('/')
        .enumerate()
        .filter(|(i, segment)| *i == 0 || !optional.is_match(segment))
        .map(|(_, segment)| segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Placeholder names of a route template in path order, `?` stripped.
///
/// Only whole-segment placeholders count: `/a/{id}/{page?}` yields
/// `["id", "page"]`.
pub fn placeholder_names(template: &str) -> Vec<String> {
    template
        .split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| name.trim_end_matches('?').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
