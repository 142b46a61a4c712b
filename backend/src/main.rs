//! ReStock backend server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restock_backend::store::{
    BatchStore, ItemStore, MemoryStore, PgBatchStore, PgItemStore, SideCache,
};
use restock_backend::{config::Config, create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restock_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting ReStock server");
    tracing::info!("Environment: {}", config.environment);

    // Load the durable side-cache
    let cache = Arc::new(SideCache::load(&config.cache.path).await);

    // Select the store adapter
    let (items, batches): (Arc<dyn ItemStore>, Arc<dyn BatchStore>) =
        if config.database.url.is_empty() {
            tracing::warn!("No database configured, using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        } else {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            (
                Arc::new(PgItemStore::new(db_pool.clone())),
                Arc::new(PgBatchStore::new(db_pool)),
            )
        };

    // Create application state
    let state = AppState {
        items,
        batches,
        cache,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
