//! Accept-Language negotiation.
//!
//! The `accept-language` crate splits and weighs the header; matching
//! against the available locales (exact tag, then primary subtag) happens
//! here.

use crate::i18n::Locale;

/// A single language range from an Accept-Language header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    /// Lowercased tag with `_` normalised to `-` (e.g., "fr-ca")
    pub tag: String,
    /// Quality weight in `0.0..=1.0`
    pub quality: f32,
}

impl LanguageRange {
    /// Primary subtag (`fr` for `fr-ca`).
    pub fn primary(&self) -> &str {
        self.tag.split('-').next().unwrap_or(&self.tag)
    }
}

/// Parse an Accept-Language header value.
///
/// Ranges are returned by descending quality, keeping header order for ties.
/// Ranges with `q=0` (or an unreadable weight), weights above 1 and wildcards
/// are dropped.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange> {
    accept_language::parse_with_quality(header)
        .into_iter()
        .filter_map(|(tag, quality)| {
            let tag = normalize_tag(&tag);
            let quality = quality as f32;
            if tag.is_empty() || tag == "*" || !(quality > 0.0 && quality <= 1.0) {
                return None;
            }
            Some(LanguageRange { tag, quality })
        })
        .collect()
}

/// Pick the preferred candidate for an Accept-Language header.
///
/// Each range is tried in preference order, first for an exact match and then
/// by primary subtag (`fr-CA` accepts `fr`).
///
/// # Returns
/// The matching candidate, or `None` if the header accepts none of them.
pub fn preferred_language(header: &str, candidates: &[Locale]) -> Option<Locale> {
    let ranges = parse_accept_language(header);

    for range in &ranges {
        if let Some(found) = candidates
            .iter()
            .find(|candidate| normalize_tag(candidate.as_str()) == range.tag)
        {
            return Some(found.clone());
        }

        if let Some(found) = candidates
            .iter()
            .find(|candidate| normalize_tag(candidate.as_str()) == range.primary())
        {
            return Some(found.clone());
        }
    }

    None
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}
