//! Translated route tables.
//!
//! Route paths are stored per locale as nested JSON objects, one file per
//! namespace: `lang/fr/routes.json` holding `{"about": "/a-propos"}` answers
//! the key `routes.about` for `fr`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::i18n::Locale;

/// Read access to translation tables.
pub trait TranslationLookup: Send + Sync {
    /// Look up a dotted key (e.g., `routes.users.show`) for a locale.
    ///
    /// Returns either a leaf string or a nested group.
    fn get(&self, key: &str, locale: &Locale) -> Option<&Value>;

    fn has(&self, key: &str, locale: &Locale) -> bool {
        self.get(key, locale).is_some()
    }
}

/// In-memory translation tables keyed by locale.
#[derive(Debug, Default, Clone)]
pub struct RouteTranslations {
    tables: HashMap<Locale, Value>,
}

impl RouteTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace for a locale, replacing any previous contents.
    pub fn insert(&mut self, locale: Locale, namespace: &str, table: Value) {
        let root = self
            .tables
            .entry(locale)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = root {
            map.insert(namespace.to_string(), table);
        }
    }

    /// Load `{dir}/{locale}/{namespace}.json` for each locale.
    ///
    /// A missing locale directory is not an error; that locale simply has no
    /// translated routes.
    pub fn load_dir(dir: impl AsRef<Path>, locales: &[Locale]) -> Result<Self> {
        let dir = dir.as_ref();
        let mut translations = Self::new();

        for locale in locales {
            let locale_dir = dir.join(locale.as_str());
            if !locale_dir.is_dir() {
                debug!(
                    "No translation directory for locale '{}' at {}",
                    locale,
                    locale_dir.display()
                );
                continue;
            }

            let mut entries: Vec<_> = fs::read_dir(&locale_dir)
                .with_context(|| format!("Failed to read {}", locale_dir.display()))?
                .collect::<std::io::Result<_>>()
                .with_context(|| format!("Failed to list {}", locale_dir.display()))?;
            entries.sort_by_key(|entry| entry.file_name());

            for entry in entries {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(namespace) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let table: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;

                translations.insert(locale.clone(), namespace, table);
            }
        }

        info!(
            "Loaded translated routes for {} locale(s) from {}",
            translations.tables.len(),
            dir.display()
        );
        Ok(translations)
    }
}

impl TranslationLookup for RouteTranslations {
    fn get(&self, key: &str, locale: &Locale) -> Option<&Value> {
        let mut node = self.tables.get(locale)?;
        for segment in key.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }
}

/// Flatten a nested table into dotted `name -> path` pairs, keeping key order.
///
/// Only string leaves are kept; a bare string flattens to nothing.
pub fn dot(value: &Value) -> Vec<(String, String)> {
    let mut flattened = Vec::new();
    if let Value::Object(map) = value {
        flatten_into(map, "", &mut flattened);
    }
    flattened
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::String(path) => out.push((name, path.clone())),
            Value::Object(children) => flatten_into(children, &name, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> RouteTranslations {
        let mut translations = RouteTranslations::new();
        translations.insert(
            Locale::new("fr"),
            "routes",
            json!({
                "about": "/a-propos",
                "users": { "show": "/utilisateurs/{id}", "list": "/utilisateurs" }
            }),
        );
        translations
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_get_leaf() {
        let translations = sample();
        let value = translations.get("routes.about", &Locale::new("fr"));
        assert_eq!(value.and_then(Value::as_str), Some("/a-propos"));
    }

    #[test]
    fn test_get_nested_leaf() {
        let translations = sample();
        let value = translations.get("routes.users.show", &Locale::new("fr"));
        assert_eq!(value.and_then(Value::as_str), Some("/utilisateurs/{id}"));
    }

    #[test]
    fn test_get_group() {
        let translations = sample();
        let group = translations.get("routes.users", &Locale::new("fr")).unwrap();
        assert!(group.is_object());
    }

    #[test]
    fn test_has() {
        let translations = sample();
        assert!(translations.has("routes.about", &Locale::new("fr")));
        assert!(!translations.has("routes.missing", &Locale::new("fr")));
        assert!(!translations.has("routes.about", &Locale::new("de")));
        assert!(!translations.has("routes.about.deeper", &Locale::new("fr")));
    }

    // ==================== Flattening Tests ====================

    #[test]
    fn test_dot_flattens_in_key_order() {
        let flattened = dot(&json!({
            "home": "/",
            "users": { "show": "/u/{id}", "edit": "/u/{id}/edit" },
            "count": 3,
            "about": "/about"
        }));
        assert_eq!(
            flattened,
            vec![
                ("home".to_string(), "/".to_string()),
                ("users.show".to_string(), "/u/{id}".to_string()),
                ("users.edit".to_string(), "/u/{id}/edit".to_string()),
                ("about".to_string(), "/about".to_string()),
            ]
        );
    }

    #[test]
    fn test_dot_of_string_is_empty() {
        assert!(dot(&json!("/about")).is_empty());
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_load_dir() {
        let temp_dir = TempDir::new().unwrap();
        let fr_dir = temp_dir.path().join("fr");
        fs::create_dir(&fr_dir).unwrap();
        fs::write(fr_dir.join("routes.json"), r#"{"about": "/a-propos"}"#).unwrap();
        fs::write(fr_dir.join("notes.txt"), "ignored").unwrap();

        let translations =
            RouteTranslations::load_dir(temp_dir.path(), &[Locale::new("fr"), Locale::new("de")])
                .expect("Should load");

        assert!(translations.has("routes.about", &Locale::new("fr")));
        assert!(!translations.has("routes.about", &Locale::new("de")));
    }

    #[test]
    fn test_load_dir_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let en_dir = temp_dir.path().join("en");
        fs::create_dir(&en_dir).unwrap();
        fs::write(en_dir.join("routes.json"), "{ not json").unwrap();

        let result = RouteTranslations::load_dir(temp_dir.path(), &[Locale::new("en")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }
}
