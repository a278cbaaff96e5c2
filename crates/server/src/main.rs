use anyhow::Context;
use server::{AppState, routes};
use services::services::{
    campaign_cleanup::CampaignCleanupService, config::ThemeServiceConfig,
    theme_preview::ThemePreviewService,
};
use tracing::{info, warn};
use utils::env::env_or;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init("info");

    let config = ThemeServiceConfig::from_env();
    let preview =
        ThemePreviewService::from_config(&config).context("failed to build theme preview service")?;

    if let Some((url, key)) = config.database_credentials() {
        match db::DBService::new(url, key) {
            Ok(db) => {
                CampaignCleanupService::new(
                    db,
                    config.campaign_ttl_hours,
                    config.campaign_cleanup_interval,
                )
                .spawn();
            }
            Err(e) => warn!(error = %e, "Campaign cleanup disabled: could not build database client"),
        }
    } else {
        info!("Campaign cleanup disabled: database credentials not configured");
    }

    let state = AppState::new(preview);
    let app = routes::router(state);

    let addr = format!("{}:{}", env_or("HOST", "127.0.0.1"), env_or("PORT", "8888"));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Theme server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Theme server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
