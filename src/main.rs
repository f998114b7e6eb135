use std::sync::Arc;

use anyhow::{Context, Result};
use subdomain_locale::app::build_router;
use subdomain_locale::config::Config;
use subdomain_locale::context::Localization;
use subdomain_locale::crypt::SealedCryptor;
use subdomain_locale::translations::RouteTranslations;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subdomain_locale=info".parse()?),
        )
        .init();

    info!("Starting localized server");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Serving locales {:?} on {} (fallback '{}')",
        config
            .locale
            .available_locales
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>(),
        config.locale.domain,
        config.locale.fallback_locale
    );

    let translations =
        RouteTranslations::load_dir(&config.routes_dir, &config.locale.available_locales)?;
    let localization = Arc::new(Localization::new(
        config.locale.clone(),
        Arc::new(translations),
        Arc::new(SealedCryptor::new(&config.app_key)),
    ));

    let app = build_router(localization);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
