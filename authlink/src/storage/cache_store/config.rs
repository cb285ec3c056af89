use std::str::FromStr;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// Backend selected by `GENERIC_CACHE_STORE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStoreKind {
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheStoreKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            t => Err(StorageError::Config(format!(
                "Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"
            ))),
        }
    }
}

/// Build a cache store and verify it can be reached.
pub async fn open_cache_store(
    kind: CacheStoreKind,
    url: Option<&str>,
) -> Result<Box<dyn CacheStore>, StorageError> {
    tracing::info!("Initializing cache store with type: {:?}", kind);

    let store: Box<dyn CacheStore> = match kind {
        CacheStoreKind::Memory => Box::new(InMemoryCacheStore::new()),
        CacheStoreKind::Redis => {
            let url = url.ok_or_else(|| {
                StorageError::Config("GENERIC_CACHE_STORE_URL must be set for redis".to_string())
            })?;
            let client = redis::Client::open(url).map_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
                StorageError::from(e)
            })?;
            Box::new(RedisCacheStore { client })
        }
    };

    store.init().await.map_err(|e| {
        tracing::error!("Failed to connect to cache store: {}", e);
        e
    })?;

    tracing::info!("Connected to cache store: type={:?}", kind);
    Ok(store)
}
