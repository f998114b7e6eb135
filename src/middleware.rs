//! axum integration: the localization middleware and the handler extractor.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/a-propos", get(about).layer(Extension(RouteName("routes.about".into()))))
//!     .layer(middleware::from_fn_with_state(localization.clone(), localize))
//!     .with_state(localization);
//! ```

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts, MatchedPath, RawPathParams, Request, State};
use axum::http::header::{LOCATION, VARY};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::{ActiveLocale, CurrentRoute, Localization, LocalizedRouteNames, RouteName};
use crate::cookies::QueuedCookies;
use crate::i18n::Locale;
use crate::request::HttpRequest;
use crate::resolver::LocaleResolver;
use crate::router::LocalizedRouter;
use crate::url_parts::{placeholder_names, RouteAttributes};

/// The signed-in user, inserted into request extensions by the host's
/// authentication layer.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedUser {
    /// Locale chosen in the user's account settings
    pub preferred_locale: Option<String>,
}

/// Resolve the request locale and redirect to its subdomain when needed.
///
/// Non-redirected requests continue with [`ActiveLocale`] in their
/// extensions. Cookies queued during detection are attached to whichever
/// response goes out.
pub async fn localize(
    State(localization): State<Arc<Localization>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let snapshot = HttpRequest::from_parts(&parts);

    let resolver = LocaleResolver::new(
        &localization.config,
        &snapshot,
        localization.cryptor.as_ref(),
    );
    let mut active = ActiveLocale::new(localization.config.fallback_locale.clone());
    let mut cookies = QueuedCookies::new();
    resolver.detect_locale(&mut active, &mut cookies);

    // Account settings override whatever the request pointed at
    if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
        apply_user_preference(&localization, user, &mut active);
    }

    if resolver.should_redirect(&active) {
        let router = LocalizedRouter::new(
            &localization.config,
            localization.translations.as_ref(),
            &snapshot,
            &active,
            CurrentRoute::default(),
        );
        match router.redirect_url() {
            Some(url) => match HeaderValue::from_str(&url) {
                Ok(location) => {
                    info!("Redirecting {} to {}", parts.uri, url);
                    let mut response = (
                        StatusCode::FOUND,
                        [(LOCATION, location), (VARY, HeaderValue::from_static("Accept-Language"))],
                    )
                        .into_response();
                    cookies.apply(response.headers_mut());
                    return response;
                }
                Err(e) => warn!("Cannot redirect to '{}': {}", url, e),
            },
            None => debug!("No redirect URL could be built for {}", parts.uri),
        }
    }

    parts.extensions.insert(active);
    let mut response = next.run(Request::from_parts(parts, body)).await;
    cookies.apply(response.headers_mut());
    response
}

fn apply_user_preference(
    localization: &Localization,
    user: &AuthenticatedUser,
    active: &mut ActiveLocale,
) {
    let Some(preferred) = user.preferred_locale.as_deref().filter(|p| !p.is_empty()) else {
        return;
    };

    let locale = Locale::new(preferred);
    if localization.config.is_available(&locale) {
        debug!("Using account locale '{}'", locale);
        active.set(locale);
    } else {
        warn!("Ignoring unavailable account locale '{}'", locale);
    }
}

/// Per-request localization handle for handlers.
///
/// Bundles the request snapshot, the active locale and the matched route so
/// a [`LocalizedRouter`] can be built on demand.
pub struct Localized {
    localization: Arc<Localization>,
    request: HttpRequest,
    active: ActiveLocale,
    route: CurrentRoute,
}

impl Localized {
    pub fn locale(&self) -> &Locale {
        self.active.get()
    }

    pub fn route(&self) -> &CurrentRoute {
        &self.route
    }

    pub fn router(&self) -> LocalizedRouter<'_, HttpRequest> {
        LocalizedRouter::new(
            &self.localization.config,
            self.localization.translations.as_ref(),
            &self.request,
            &self.active,
            self.route.clone(),
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Localized
where
    S: Send + Sync,
    Arc<Localization>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let localization = Arc::<Localization>::from_ref(state);

        let active = parts
            .extensions
            .get::<ActiveLocale>()
            .cloned()
            .unwrap_or_else(|| ActiveLocale::new(localization.config.fallback_locale.clone()));

        let raw_parameters: Vec<(String, String)> =
            match RawPathParams::from_request_parts(parts, state).await {
                Ok(params) => params
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
                Err(_) => Vec::new(),
            };

        let name = parts
            .extensions
            .get::<RouteName>()
            .map(|name| name.0.clone())
            .or_else(|| {
                parts
                    .extensions
                    .get::<LocalizedRouteNames>()
                    .and_then(|names| names.get(active.get()))
                    .map(str::to_string)
            });

        let parameters = match &name {
            Some(name) => alias_parameters(&localization, name, &raw_parameters),
            None => raw_parameters.into_iter().collect(),
        };

        let route = CurrentRoute {
            name,
            uri: parts
                .extensions
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_string()),
            parameters,
        };

        Ok(Self {
            localization,
            request: HttpRequest::from_parts(parts),
            active,
            route,
        })
    }
}

/// Matched path parameters, also keyed by each locale's placeholder names.
///
/// Locales may spell a route's placeholders differently (`{slug}` vs `{id}`)
/// while sharing one registered path. Values are matched to names by
/// position so every locale's template can be filled.
fn alias_parameters(
    localization: &Localization,
    route_name: &str,
    raw: &[(String, String)],
) -> RouteAttributes {
    let mut parameters: RouteAttributes = raw.iter().cloned().collect();

    for locale in &localization.config.available_locales {
        let Some(Value::String(template)) = localization.translations.get(route_name, locale)
        else {
            continue;
        };
        for (alias, (_, value)) in placeholder_names(template).into_iter().zip(raw) {
            parameters.entry(alias).or_insert_with(|| value.clone());
        }
    }

    parameters
}
