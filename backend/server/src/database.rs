//! # Redis
//!
//! Document store for recipes.
//!
//! ## Requirements
//!
//! - One collection of recipe documents
//! - Lookup, replace and delete by id
//! - Full scans for the list view (no pagination, small dataset)
//!
//! ## Implementation
//!
//! - Redis hash: 1 key per database (`<database>:recipes`), then id-document pairs
//! - Documents are JSON strings
//! - Replace runs as a Lua script so a concurrent delete is never undone
//! - Filtering and sorting happen in the server, see [`crate::listing`]
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::recipe::{Recipe, RecipeId, RecipeRecord};

const COLLECTION: &str = "recipes";

const REPLACE_SCRIPT: &str = r"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn insert(&self, recipe: Recipe) -> StoreResult<RecipeId>;

    /// Returns false when no document matched; nothing is created in that case.
    async fn replace(&self, id: &RecipeId, recipe: Recipe) -> StoreResult<bool>;

    async fn get(&self, id: &RecipeId) -> StoreResult<Option<RecipeRecord>>;

    async fn delete(&self, id: &RecipeId) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<RecipeRecord>>;
}

pub struct RedisStore {
    connection: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, database_name: &str) -> StoreResult<Self> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        Ok(Self {
            connection,
            key: format!("{database_name}:{COLLECTION}"),
        })
    }
}

#[async_trait]
impl RecipeStore for RedisStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;

        Ok(())
    }

    async fn insert(&self, recipe: Recipe) -> StoreResult<RecipeId> {
        let record = RecipeRecord {
            id: RecipeId::new(),
            recipe,
        };
        let document = serde_json::to_string(&record)?;

        let mut connection = self.connection.clone();
        let _: () = connection
            .hset(&self.key, record.id.to_string(), document)
            .await?;

        debug!("Inserted recipe {}", record.id);
        Ok(record.id)
    }

    async fn replace(&self, id: &RecipeId, recipe: Recipe) -> StoreResult<bool> {
        let record = RecipeRecord { id: *id, recipe };
        let document = serde_json::to_string(&record)?;

        let mut connection = self.connection.clone();
        let matched: i64 = Script::new(REPLACE_SCRIPT)
            .key(&self.key)
            .arg(id.to_string())
            .arg(document)
            .invoke_async(&mut connection)
            .await?;

        Ok(matched == 1)
    }

    async fn get(&self, id: &RecipeId) -> StoreResult<Option<RecipeRecord>> {
        let mut connection = self.connection.clone();
        let document: Option<String> = connection.hget(&self.key, id.to_string()).await?;

        document
            .map(|document| serde_json::from_str(&document))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn delete(&self, id: &RecipeId) -> StoreResult<bool> {
        let mut connection = self.connection.clone();
        let removed: i64 = connection.hdel(&self.key, id.to_string()).await?;

        Ok(removed > 0)
    }

    async fn list(&self) -> StoreResult<Vec<RecipeRecord>> {
        let mut connection = self.connection.clone();
        let documents: Vec<String> = connection.hvals(&self.key).await?;

        documents
            .iter()
            .map(|document| serde_json::from_str(document).map_err(StoreError::from))
            .collect()
    }
}

/// In-memory store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<RecipeId, Recipe>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, recipe: Recipe) -> StoreResult<RecipeId> {
        let id = RecipeId::new();
        self.documents.write().await.insert(id, recipe);

        Ok(id)
    }

    async fn replace(&self, id: &RecipeId, recipe: Recipe) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;

        Ok(match documents.get_mut(id) {
            Some(existing) => {
                *existing = recipe;
                true
            }
            None => false,
        })
    }

    async fn get(&self, id: &RecipeId) -> StoreResult<Option<RecipeRecord>> {
        let documents = self.documents.read().await;

        Ok(documents.get(id).map(|recipe| RecipeRecord {
            id: *id,
            recipe: recipe.clone(),
        }))
    }

    async fn delete(&self, id: &RecipeId) -> StoreResult<bool> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<RecipeRecord>> {
        let documents = self.documents.read().await;

        Ok(documents
            .iter()
            .map(|(id, recipe)| RecipeRecord {
                id: *id,
                recipe: recipe.clone(),
            })
            .collect())
    }
}
