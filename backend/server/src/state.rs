use std::sync::Arc;

use tracing::info;

use super::{
    config::{Config, StoreBackend},
    database::{MemoryStore, RecipeStore, RedisStore},
    deploy::Deployer,
    error::StartupError,
    session::SessionStore,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn RecipeStore>,
    pub sessions: SessionStore,
    pub deployer: Deployer,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let store: Arc<dyn RecipeStore> = match config.store_backend {
            StoreBackend::Redis => Arc::new(
                RedisStore::connect(&config.redis_url, &config.database_name).await?,
            ),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };

        store.ping().await?;
        info!("Connected to {:?} store", config.store_backend);

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn RecipeStore>) -> Arc<Self> {
        let sessions = SessionStore::new(&config.session_key);
        let deployer = Deployer::from_config(&config);

        Arc::new(Self {
            config,
            store,
            sessions,
            deployer,
        })
    }
}
