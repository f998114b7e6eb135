//! Read-only view of the inbound request.
//!
//! The resolver and router only ever see a request through [`RequestInfo`],
//! so tests and other hosts can hand them any implementation.

use axum::http::header::{ACCEPT_LANGUAGE, HOST};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};

use crate::cookies::read_cookie;
use crate::i18n::{preferred_language, Locale};

/// Request accessors used during locale resolution and URL building.
pub trait RequestInfo {
    fn method(&self) -> &Method;

    /// Whether this is an XMLHttpRequest (AJAX) call.
    fn is_ajax(&self) -> bool;

    /// Absolute URL of the request, if it can be reconstructed.
    fn full_url(&self) -> Option<String>;

    /// Host name without port.
    fn host(&self) -> Option<String>;

    /// Request path without leading slash (`""` for the root).
    fn path(&self) -> String;

    fn cookie(&self, name: &str) -> Option<String>;

    fn query(&self, name: &str) -> Option<String>;

    /// Best available candidate according to the client's language preferences.
    fn preferred_language(&self, candidates: &[Locale]) -> Option<Locale>;
}

/// Owned snapshot of an HTTP request's head.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl HttpRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    /// `Host` header with port, falling back to the URI authority.
    fn authority(&self) -> Option<String> {
        self.headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))
            .filter(|a| !a.is_empty())
    }

    fn scheme(&self) -> String {
        self.headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .or_else(|| self.uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string())
    }
}

impl RequestInfo for HttpRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn is_ajax(&self) -> bool {
        self.headers
            .get("x-requested-with")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
            .unwrap_or(false)
    }

    fn full_url(&self) -> Option<String> {
        let authority = self.authority()?;
        let path_and_query = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Some(format!("{}://{}{}", self.scheme(), authority, path_and_query))
    }

    fn host(&self) -> Option<String> {
        let authority = self.authority()?;
        // Bracketed IPv6 literals keep their colons
        let host = if authority.starts_with('[') {
            authority.split_inclusive(']').next().unwrap_or(&authority)
        } else {
            authority.split(':').next().unwrap_or(&authority)
        };
        Some(host.to_ascii_lowercase())
    }

    fn path(&self) -> String {
        self.uri.path().trim_start_matches('/').to_string()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        read_cookie(&self.headers, name)
    }

    fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn preferred_language(&self, candidates: &[Locale]) -> Option<Locale> {
        let header = self
            .headers
            .get_all(ACCEPT_LANGUAGE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        preferred_language(&header, candidates)
    }
}
