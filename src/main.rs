/// Proxy server entry point
use exoplanet_gateway::config::AppConfig;
use exoplanet_gateway::handlers::AppState;
use exoplanet_gateway::routes::build_router;
use exoplanet_gateway::ArchiveGateway;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(
        "Configuration loaded (archive: {}, classifier: {}, timeout: {:?})",
        config.gateway.archive_base_url,
        config.gateway.classifier_base_url,
        config.gateway.request_timeout
    );

    let gateway = ArchiveGateway::new(&config.gateway)?;
    let state = AppState::new(Arc::new(gateway));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("exoplanet gateway listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
