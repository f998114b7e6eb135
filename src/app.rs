//! Demo application serving every translated route.
//!
//! Each path of each locale's `routes` table becomes an axum route tagged
//! with the [`LocalizedRouteNames`] it has across locales. Pages answer with
//! the active locale and the URLs of the same page in the other locales.

use std::sync::Arc;

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use indexmap::IndexMap;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::context::{Localization, LocalizedRouteNames};
use crate::middleware::{localize, Localized};
use crate::router::ROUTES_NAMESPACE;
use crate::translations::{dot, TranslationLookup};

/// JSON body of a page.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub locale: String,
    pub route: Option<String>,
    pub alternates: IndexMap<String, String>,
}

/// Build the application router.
///
/// Paths are registered once per shape: `/article/{slug}` in one locale and
/// `/article/{id}` in another share the first spelling. Each registered path
/// carries the route name every declaring locale gives it, so the same path
/// can be a different route depending on the active locale. Templates axum
/// cannot express are skipped with a warning.
pub fn build_router(localization: Arc<Localization>) -> Router {
    let mut shapes: IndexMap<String, (String, LocalizedRouteNames)> = IndexMap::new();

    for locale in &localization.config.available_locales {
        let routes = localization
            .translations
            .get(ROUTES_NAMESPACE, locale)
            .map(dot)
            .unwrap_or_default();

        for (name, template) in routes {
            let route_name = format!("{}.{}", ROUTES_NAMESPACE, name);
            let Some(paths) = axum_paths(&template) else {
                warn!(
                    "Skipping route '{}' for '{}': unsupported path '{}'",
                    route_name, locale, template
                );
                continue;
            };

            for path in paths {
                let (_, names) = shapes
                    .entry(path_shape(&path))
                    .or_insert_with(|| (path.clone(), LocalizedRouteNames::default()));
                names
                    .0
                    .entry(locale.clone())
                    .or_insert_with(|| route_name.clone());
            }
        }
    }

    info!("Registering {} localized route(s)", shapes.len());

    let mut router: Router<Arc<Localization>> = Router::new();
    for (path, names) in shapes.into_values() {
        debug!("Registering {} as {:?}", path, names.0);
        router = router.route(&path, get(show_page).layer(Extension(names)));
    }

    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(localization.clone(), localize))
        .layer(TraceLayer::new_for_http())
        .with_state(localization)
}

async fn show_page(localized: Localized) -> Response {
    if let Some(url) = foreign_path_redirect(&localized) {
        return found(&url);
    }

    let mut router = localized.router();
    let alternates = router
        .current_versions(true)
        .into_iter()
        .map(|(locale, url)| (locale.to_string(), url))
        .collect();

    Json(PageView {
        locale: localized.locale().to_string(),
        route: localized.route().name.clone(),
        alternates,
    })
    .into_response()
}

async fn not_found(localized: Localized) -> Response {
    match foreign_path_redirect(&localized) {
        Some(url) => found(&url),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

/// URL of the locale whose route table owns the requested path.
///
/// The target carries `langSwitch` so a stored cookie for the current locale
/// does not bounce the visitor straight back.
fn foreign_path_redirect(localized: &Localized) -> Option<String> {
    let mut router = localized.router();
    let (locale, route_name) = router.locate_path_in_other_locale(ROUTES_NAMESPACE)?;
    router.url(&route_name, None, Some(&locale), true)
}

fn found(url: &str) -> Response {
    match HeaderValue::from_str(url) {
        Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        Err(e) => {
            warn!("Invalid redirect target '{}': {}", url, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Translate a route template into axum paths.
///
/// `{id}` becomes `:id`. A template with `{name?}` segments yields the path
/// with every optional segment and the path without any of them.
///
/// # Returns
/// `None` when a segment mixes placeholders with text or holds characters
/// axum reserves for its own path syntax.
pub fn axum_paths(template: &str) -> Option<Vec<String>> {
    let segments: Vec<&str> = template
        .trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut full = Vec::with_capacity(segments.len());
    let mut required = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => {
                let (name, optional) = match inner.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if !is_parameter_name(name) {
                    return None;
                }
                full.push(format!(":{}", name));
                if !optional {
                    required.push(format!(":{}", name));
                }
            }
            None if segment.contains(['{', '}', ':', '*', '?']) => return None,
            None => {
                full.push(segment.to_string());
                required.push(segment.to_string());
            }
        }
    }

    let full = format!("/{}", full.join("/"));
    let required = format!("/{}", required.join("/"));
    if full == required {
        Some(vec![full])
    } else {
        Some(vec![full, required])
    }
}

fn is_parameter_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Path with parameter names erased; axum rejects two paths of one shape.
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axum_paths_static() {
        assert_eq!(axum_paths("/a-propos"), Some(vec!["/a-propos".to_string()]));
        assert_eq!(axum_paths("about/team"), Some(vec!["/about/team".to_string()]));
    }

    #[test]
    fn test_axum_paths_root() {
        assert_eq!(axum_paths("/"), Some(vec!["/".to_string()]));
        assert_eq!(axum_paths(""), Some(vec!["/".to_string()]));
    }

    #[test]
    fn test_axum_paths_parameters() {
        assert_eq!(axum_paths("/users/{id}"), Some(vec!["/users/:id".to_string()]));
    }

    #[test]
    fn test_axum_paths_optional_segments() {
        assert_eq!(
            axum_paths("/a/{id}/{opt?}"),
            Some(vec!["/a/:id/:opt".to_string(), "/a/:id".to_string()])
        );
    }

    #[test]
    fn test_axum_paths_rejects_unsupported_segments() {
        assert_eq!(axum_paths("/a-{id}"), None);
        assert_eq!(axum_paths("/files/*rest"), None);
        assert_eq!(axum_paths("/a/:id"), None);
        assert_eq!(axum_paths("/a/{}"), None);
        assert_eq!(axum_paths("/a/{bad name}"), None);
    }

    #[test]
    fn test_path_shape_erases_parameter_names() {
        assert_eq!(path_shape("/article/:slug"), path_shape("/article/:id"));
        assert_ne!(path_shape("/article/:slug"), path_shape("/article/new"));
        assert_eq!(path_shape("/"), "/");
    }
}
