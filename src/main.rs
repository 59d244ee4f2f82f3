mod config;

use anyhow::Result;
use crate::config::AppConfig;
use oddspulse_api::{build_router, AppState};
use oddspulse_services::{
    spawn_highlight_feed, DerivedViewEngine, FilterStore, HighlightLifecycle, MatchStore,
    OddsUpdateScheduler,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "oddspulse=debug,oddspulse_services=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting OddsPulse live odds board");

    // Load configuration
    let config = AppConfig::new()?;
    config.validate()?;
    info!("✅ Configuration loaded successfully");
    info!(
        "⏱️ Updates every {}ms (cap {}), highlights clear after {}ms",
        config.simulation.interval_ms,
        config.simulation.max_updates,
        config.highlight.clear_delay_ms
    );

    let match_store = Arc::new(MatchStore::seeded());
    info!("📋 Seeded {} matches", match_store.snapshot().len());

    let scheduler = OddsUpdateScheduler::new(match_store.clone(), config.scheduler_config())?;
    let highlights = HighlightLifecycle::new(match_store.clone(), config.clear_delay());
    let feed_handle = spawn_highlight_feed(match_store.subscribe(), highlights.clone());

    if config.simulation.autostart {
        scheduler.start();
    } else {
        info!("⏸️ Autostart disabled - POST /api/v1/simulation/start to begin");
    }

    let state = AppState {
        match_store,
        filter_store: Arc::new(FilterStore::new()),
        views: Arc::new(DerivedViewEngine::new()),
        scheduler: scheduler.clone(),
        highlights: highlights.clone(),
        started_at: Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    info!("🌐 Listening on {}", config.server_addr());
    info!("⌨️  Press Ctrl+C to stop");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("👋 Shutting down gracefully");

    // Clean shutdown
    scheduler.destroy();
    highlights.cleanup();
    feed_handle.abort();

    Ok(())
}
