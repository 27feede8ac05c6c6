//! coursecache - keeps the course catalog warm in front of MongoDB.
//!
//! Connects to the backend, warms the admin course list and the videos of
//! every course, then sweeps expired entries until Ctrl-C.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coursecache::config::Config;
use coursecache::{CatalogCache, MongoBackend};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coursecache=info,mongodb=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting coursecache...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!(
        "Retry policy: {} attempt(s), worst case {:?}",
        config.retry.max_attempts,
        config.retry.worst_case()
    );

    info!("Connecting to MongoDB...");
    let backend = MongoBackend::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    info!("Database connected");

    let catalog = CatalogCache::new(Arc::new(backend), config.catalog_options())?;
    let catalog = Arc::new(catalog);
    catalog.start_sweeper();

    if let Some(scope) = &config.warm_admin_scope {
        warm(&catalog, scope, config.loader.batch_size).await;
    } else {
        info!("WARM_ADMIN_SCOPE not set, skipping warm-up");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    let stats = catalog.stats();
    info!(
        "Final cache stats: {} active, {} expired, {} total",
        stats.active, stats.expired, stats.total
    );
    catalog.dispose();

    Ok(())
}

/// Load the admin course list, then the videos of every course.
async fn warm(catalog: &CatalogCache, scope: &str, batch_size: usize) {
    let courses = catalog.get_courses(scope, true).await;
    if let Some(err) = &courses.error {
        warn!("Course list unavailable, warm-up used placeholders: {}", err);
        return;
    }
    info!("Warmed {} course(s)", courses.data.len());

    let course_ids: Vec<&str> = courses.data.iter().map(|c| c.id.as_str()).collect();
    let videos = catalog.load_multiple_courses(&course_ids, batch_size).await;
    let video_count: usize = videos.values().map(Vec::len).sum();
    info!("Warmed {} video(s) across {} course(s)", video_count, videos.len());

    let stats = catalog.stats();
    info!(
        "Cache stats: {} active, {} expired, {} total",
        stats.active, stats.expired, stats.total
    );
}
