//! Subdomain-based locale resolution and localized URL routing.
//!
//! Each request is served in one locale, chosen from the URL subdomain
//! (`fr.example.com`), a `langSwitch` query override, an encrypted cookie,
//! the browser's Accept-Language header or the configured fallback. Requests
//! that land on the wrong subdomain are redirected to the right one, and
//! handlers can build the same page's URL in every other locale.

pub mod app;
pub mod config;
pub mod context;
pub mod cookies;
pub mod crypt;
pub mod i18n;
pub mod middleware;
pub mod request;
pub mod resolver;
pub mod router;
pub mod translations;
pub mod url_parts;
