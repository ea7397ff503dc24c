use catalog_cache::{
    api,
    backend::RedisBackend,
    config::Settings,
    observability::LogMetrics,
    search::ElasticsearchBackend,
    service::Catalog,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env()?;
    log::info!(
        "Starting {} v{} ({})",
        settings.project_name,
        settings.project_version,
        settings.project_description
    );

    // ========================================================================
    // Stores
    // ========================================================================

    let cache = RedisBackend::new(settings.redis_config()).await?;
    let search = ElasticsearchBackend::new(settings.elasticsearch_config())?;

    // ========================================================================
    // Services
    // ========================================================================

    let catalog = Catalog::new(
        cache,
        search,
        &settings.ttl_policy(),
        settings.service_config(),
    )
    .with_metrics(Arc::new(LogMetrics));

    let report = catalog.health().await;
    if !report.is_serving() {
        log::warn!("Search store is not reachable yet, requests will fail with 503 until it is");
    }

    // ========================================================================
    // Server
    // ========================================================================

    let app = api::router(catalog);
    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
