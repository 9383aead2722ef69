//! Livewear order service binary
//!
//! Reads `LIVEWEAR_CONFIG` (YAML) plus environment overrides, seeds fixtures
//! if configured, and serves the HTTP API until SIGINT/SIGTERM.

use anyhow::Result;
use livewear::config::{AppConfig, Fixtures, StorageConfig};
use livewear::server::ServerBuilder;
use livewear::storage::InMemoryStore;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "livewear=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        app = %config.app_name,
        version = %config.version,
        environment = ?config.environment,
        "starting"
    );

    let fixtures = match &config.fixtures {
        Some(path) => Some(Fixtures::from_yaml_file(path)?),
        None => None,
    };

    let builder = match config.storage.clone() {
        StorageConfig::Memory => {
            let store = InMemoryStore::new();
            if let Some(fixtures) = &fixtures {
                fixtures.seed(&store, &store).await?;
            }
            tracing::info!("using in-memory storage");
            ServerBuilder::new(config.clone()).with_store(store)
        }
        StorageConfig::Mongodb { uri, database } => mongo_builder(&config, &uri, &database, fixtures.as_ref()).await?,
    };

    let builder = builder.with_event_bus(config.event_bus_capacity);
    if let Some(bus) = builder.event_bus() {
        bus.spawn_logger();
    }

    builder.serve().await
}

#[cfg(feature = "mongodb_backend")]
async fn mongo_builder(
    config: &AppConfig,
    uri: &str,
    database: &str,
    fixtures: Option<&Fixtures>,
) -> Result<ServerBuilder> {
    use livewear::storage::MongoStore;

    let store = MongoStore::connect(uri, database).await?;
    store.ensure_indexes().await?;
    if let Some(fixtures) = fixtures {
        fixtures.seed(&store, &store).await?;
    }
    tracing::info!(database, "using MongoDB storage");

    Ok(ServerBuilder::new(config.clone()).with_store(store))
}

#[cfg(not(feature = "mongodb_backend"))]
async fn mongo_builder(
    _config: &AppConfig,
    _uri: &str,
    _database: &str,
    _fixtures: Option<&Fixtures>,
) -> Result<ServerBuilder> {
    anyhow::bail!("MongoDB storage requested but the `mongodb_backend` feature is not enabled")
}
