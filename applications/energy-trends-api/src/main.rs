use energy_trends_api::db::{self, RetryPolicy};
use energy_trends_api::repositories::PgReadingRepository;
use energy_trends_api::services::TrendsService;
use energy_trends_api::{api, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting energy-trends-api");

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(path = %cfg_path, "Configuration loaded");

    let pool = db::connect(&cfg.database).await?;
    info!("Connected to database");

    let repository = PgReadingRepository::new(
        pool.clone(),
        RetryPolicy::from(&cfg.database.retry),
        Duration::from_secs(cfg.database.fetch_timeout_secs),
    );
    let service = TrendsService::new(Arc::new(repository), cfg.tariff.clone());

    let router = api::create_router(service);
    let addr = cfg.api_bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("API server listening on {}", addr);

    let serve = axum::serve(listener, router);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    };

    if let Err(e) = serve.with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %e, "API server error");
    }

    pool.close().await;
    info!("Application shutdown complete");
    Ok(())
}
