use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use sewa_api::{ApiState, config::ApiConfig};
use sewa_core::roles::RoleGate;
use sewa_db::{PgStore, RemoteStore, schema::initialize_database};
use sewa_sync::{Engine, FileCache, SystemClock};
use tracing::{info, warn};

/// Connects to Postgres when configured. Any failure leaves the server
/// running in local-only mode.
async fn connect_remote(database_url: Option<&str>) -> Option<Arc<dyn RemoteStore>> {
    let Some(url) = database_url else {
        info!("DATABASE_URL not set, running local-only");
        return None;
    };

    let store = match PgStore::connect(url).await {
        Ok(store) => store,
        Err(e) => {
            warn!("Remote store unavailable, running local-only: {:#}", e);
            return None;
        }
    };

    if let Err(e) = initialize_database(store.pool()).await {
        warn!("Schema initialization failed: {:#}", e);
    }
    Some(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    sewa_api::init_tracing(&config)?;

    let directory = config.load_directory()?;
    let roster_seed = config.load_roster_seed()?;
    let cache = FileCache::open(&config.cache_dir).wrap_err("Failed to open local cache")?;
    info!("Local cache at {}", cache.path().display());

    let remote = connect_remote(config.database_url.as_deref()).await;
    let engine = Engine::connect(
        remote,
        Arc::new(cache),
        RoleGate::new(directory),
        config.reward_policy,
        Arc::new(SystemClock),
    )
    .await;

    // Both run for the life of the process.
    let _changes = engine.spawn_listener();
    let _mirror = engine.spawn_cache_listener();

    let state = Arc::new(ApiState::new(engine, roster_seed));
    sewa_api::start_server(config, state).await?;

    Ok(())
}
