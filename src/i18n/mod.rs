//! Locale primitives shared by the resolver and the router.
//!
//! # Architecture
//!
//! - `locale`: The `Locale` identifier and the implicit default locale
//! - `negotiation`: Accept-Language parsing and matching against available locales
//!
//! # Example
//!
//! ```rust,ignore
//! use subdomain_locale::i18n::{preferred_language, Locale};
//!
//! let available = vec![Locale::new("en"), Locale::new("fr")];
//! let chosen = preferred_language("fr-CA,fr;q=0.9,en;q=0.5", &available);
//! assert_eq!(chosen, Some(Locale::new("fr")));
//! ```

mod locale;
mod negotiation;

pub use locale::{Locale, LocaleError, DEFAULT_LOCALE};
pub use negotiation::{parse_accept_language, preferred_language, LanguageRange};
