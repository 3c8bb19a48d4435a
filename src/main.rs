use std::sync::Arc;

use marquee_api::{
    config::Config,
    db::{self, MemoryStore, MovieStore, PgStore, RatingStore, UsageMeter, WatchlistStore},
    routes::{create_router, AppState},
    services::{CatalogClient, OmdbClient},
};
use tracing_subscriber::EnvFilter;

type Stores = (
    Arc<dyn MovieStore>,
    Arc<dyn RatingStore>,
    Arc<dyn WatchlistStore>,
);

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Connected to Postgres");
            let store = PgStore::new(pool);
            Ok((
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
            ))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, movies and ratings are kept in memory");
            let store = MemoryStore::new();
            Ok((
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store),
            ))
        }
    }
}

fn build_catalog(config: &Config) -> anyhow::Result<Arc<dyn CatalogClient>> {
    let mut client = OmdbClient::new(
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
        config.upstream_timeout(),
    )?;

    if let Some(redis_url) = &config.redis_url {
        let redis_client = db::create_redis_client(redis_url)?;
        client = client.with_usage_meter(UsageMeter::new(
            redis_client,
            config.daily_upstream_quota,
        ));
        tracing::info!(
            quota = config.daily_upstream_quota,
            "Catalog usage metering enabled"
        );
    }

    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marquee_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let (movies, ratings, watchlist) = open_stores(&config).await?;
    let catalog = build_catalog(&config)?;

    let state = Arc::new(AppState::new(
        movies,
        ratings,
        watchlist,
        catalog,
        config.upstream_timeout(),
        config.precache_concurrency,
    ));

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
