//! Locale cookie payload and response cookie queueing.
//!
//! The locale cookie stores `{version}|{locale}` sealed by a [`Cryptor`].
//! The version token lives in a separate plain cookie; changing it
//! invalidates every locale cookie issued before.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use tracing::{debug, warn};

use crate::crypt::{constant_time_eq, Cryptor};
use crate::i18n::Locale;

/// Lifetime of a "forever" cookie: five years.
pub const FOREVER_MINUTES: i64 = 2_628_000;

/// Decrypted locale cookie payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCookie {
    pub version: String,
    pub locale: Locale,
}

impl LocaleCookie {
    pub fn new(version: impl Into<String>, locale: Locale) -> Self {
        Self {
            version: version.into(),
            locale,
        }
    }

    /// Plaintext form before encryption.
    pub fn payload(&self) -> String {
        format!("{}|{}", self.version, self.locale)
    }

    /// Parse a decrypted payload. Anything other than exactly two fields is rejected.
    pub fn parse(payload: &str) -> Option<Self> {
        let mut fields = payload.split('|');
        let version = fields.next()?;
        let locale = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(version, Locale::new(locale)))
    }

    pub fn seal(&self, cryptor: &dyn Cryptor) -> String {
        cryptor.encrypt(&self.payload())
    }

    /// Decrypt a cookie value and return its locale if the version matches.
    ///
    /// # Returns
    /// * `Some(Locale)` when the value decrypts and carries `current_version`
    /// * `None` on decryption failure, malformed payload or version mismatch
    pub fn open(cryptor: &dyn Cryptor, sealed: &str, current_version: &str) -> Option<Locale> {
        let payload = match cryptor.decrypt(sealed) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Ignoring locale cookie that failed to decrypt: {}", e);
                return None;
            }
        };

        let cookie = Self::parse(&payload)?;
        if !constant_time_eq(&cookie.version, current_version) {
            debug!(
                "Ignoring locale cookie with stale version '{}' (current '{}')",
                cookie.version, current_version
            );
            return None;
        }

        Some(cookie.locale)
    }
}

/// Look up a cookie by name across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().trim_matches('"').to_string())
}

/// A persistent cookie that effectively never expires.
///
/// Scoped to the whole site, hidden from scripts and sent on top-level
/// navigations only.
pub fn forever_cookie(
    name: impl Into<String>,
    value: impl Into<String>,
    domain: Option<String>,
) -> Cookie<'static> {
    let lifetime = Duration::minutes(FOREVER_MINUTES);
    let mut builder = Cookie::build((name.into(), value.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(lifetime)
        .expires(OffsetDateTime::now_utc() + lifetime);
    if let Some(domain) = domain {
        builder = builder.domain(domain);
    }
    builder.build()
}

/// Sink for cookies that must accompany the response.
pub trait CookieWriter {
    fn queue(&mut self, cookie: Cookie<'static>);
}

/// Cookies queued while handling one request.
#[derive(Debug, Default, Clone)]
pub struct QueuedCookies {
    cookies: Vec<Cookie<'static>>,
}

impl QueuedCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie<'static>> {
        self.cookies.iter()
    }

    /// Append a `Set-Cookie` header for every queued cookie.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => warn!(
                    "Dropping cookie '{}' with invalid header value: {}",
                    cookie.name(),
                    e
                ),
            }
        }
    }
}

impl CookieWriter for QueuedCookies {
    fn queue(&mut self, cookie: Cookie<'static>) {
        // A later cookie with the same name replaces the earlier one
        self.cookies.retain(|queued| queued.name() != cookie.name());
        self.cookies.push(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypt::SealedCryptor;

    fn cryptor() -> SealedCryptor {
        SealedCryptor::new("cookie-test-secret-0001")
    }

    // ==================== Payload Tests ====================

    #[test]
    fn test_payload_format() {
        let cookie = LocaleCookie::new("3", Locale::new("fr"));
        assert_eq!(cookie.payload(), "3|fr");
    }

    #[test]
    fn test_parse_payload() {
        let cookie = LocaleCookie::parse("3|de").unwrap();
        assert_eq!(cookie.version, "3");
        assert_eq!(cookie.locale, "de");
    }

    #[test]
    fn test_parse_payload_with_empty_version() {
        let cookie = LocaleCookie::parse("|es").unwrap();
        assert_eq!(cookie.version, "");
        assert_eq!(cookie.locale, "es");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(LocaleCookie::parse("fr").is_none());
        assert!(LocaleCookie::parse("1|fr|extra").is_none());
        assert!(LocaleCookie::parse("").is_none());
    }

    // ==================== Seal/Open Tests ====================

    #[test]
    fn test_open_with_matching_version() {
        let cryptor = cryptor();
        let sealed = LocaleCookie::new("v7", Locale::new("fr")).seal(&cryptor);
        assert_eq!(LocaleCookie::open(&cryptor, &sealed, "v7"), Some(Locale::new("fr")));
    }

    #[test]
    fn test_open_with_mismatched_version() {
        let cryptor = cryptor();
        let sealed = LocaleCookie::new("v7", Locale::new("fr")).seal(&cryptor);
        assert_eq!(LocaleCookie::open(&cryptor, &sealed, "v8"), None);
        assert_eq!(LocaleCookie::open(&cryptor, &sealed, ""), None);
    }

    #[test]
    fn test_open_tampered_value_is_absent() {
        let cryptor = cryptor();
        assert_eq!(LocaleCookie::open(&cryptor, "not-a-sealed-value", ""), None);
        assert_eq!(LocaleCookie::open(&cryptor, "|fr", ""), None);
    }

    // ==================== Header Tests ====================

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; locale=abc; locale_version=2"));
        assert_eq!(read_cookie(&headers, "locale").as_deref(), Some("abc"));
        assert_eq!(read_cookie(&headers, "locale_version").as_deref(), Some("2"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=\"quoted\""));
        assert_eq!(read_cookie(&headers, "b").as_deref(), Some("quoted"));
    }

    #[test]
    fn test_read_cookie_keeps_padding_in_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("locale=YWJj+/w=="));
        assert_eq!(read_cookie(&headers, "locale").as_deref(), Some("YWJj+/w=="));
    }

    // ==================== Set-Cookie Tests ====================

    #[test]
    fn test_forever_cookie_attributes() {
        let cookie = forever_cookie("locale", "sealed", None);
        assert_eq!(cookie.name(), "locale");
        assert_eq!(cookie.value(), "sealed");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(FOREVER_MINUTES)));
        assert_eq!(cookie.domain(), None);

        let expires = cookie.expires_datetime().expect("Should expire");
        assert!(expires > OffsetDateTime::now_utc() + Duration::days(4 * 365));
    }

    #[test]
    fn test_forever_cookie_rendering() {
        let rendered = forever_cookie("locale", "sealed", None).to_string();
        assert!(rendered.starts_with("locale=sealed"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=157680000"));
        assert!(rendered.contains("Expires="));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(!rendered.contains("Domain="));
    }

    #[test]
    fn test_cookie_with_domain() {
        let cookie = forever_cookie("locale", "x", Some("example.com".to_string()));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert!(cookie.to_string().contains("Domain=example.com"));
    }

    #[test]
    fn test_queue_replaces_same_name_and_applies() {
        let mut queued = QueuedCookies::new();
        queued.queue(forever_cookie("locale", "first", None));
        queued.queue(forever_cookie("other", "x", None));
        queued.queue(forever_cookie("locale", "second", None));
        assert_eq!(queued.iter().count(), 2);

        let mut headers = HeaderMap::new();
        queued.apply(&mut headers);
        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert!(values[1].to_str().unwrap().starts_with("locale=second"));
    }
}
