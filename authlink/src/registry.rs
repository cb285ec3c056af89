//! Process-wide handle that owns every store and client the flows need.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::{AuthConfig, ConfigError};
use crate::provider::{OAuth2Client, ProviderError, ProviderRegistry};
use crate::session::SessionManager;
use crate::storage::{
    CacheStore, CacheStoreKind, DataStoreKind, InMemoryCacheStore, SharedCacheStore, StorageError,
    open_cache_store, open_data_store,
};
use crate::userdb::{InMemoryUserStore, SqlUserStore, UserError, UserStore};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("User store error: {0}")]
    User(#[from] UserError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub struct AuthRegistry {
    config: AuthConfig,
    users: Arc<dyn UserStore>,
    sessions: SessionManager,
    providers: ProviderRegistry,
    oauth2: OAuth2Client,
}

impl AuthRegistry {
    /// Read the environment, open the configured stores and create the user tables.
    pub async fn from_env() -> Result<Self, InitError> {
        let config = AuthConfig::from_env()?;
        let providers = ProviderRegistry::from_lookup(&config.origin, |name| std::env::var(name).ok());
        Self::open(config, providers).await
    }

    pub async fn open(config: AuthConfig, providers: ProviderRegistry) -> Result<Self, InitError> {
        let cache = open_cache_store(config.cache_store_kind, config.cache_store_url.as_deref()).await?;

        let users: Arc<dyn UserStore> = match config.data_store_kind {
            DataStoreKind::Memory => Arc::new(InMemoryUserStore::new()),
            kind => {
                let store = open_data_store(kind, &config.data_store_url)?;
                Arc::new(SqlUserStore::new(store, &config.table_prefix))
            }
        };
        users.init().await?;

        tracing::info!(
            data_store = ?config.data_store_kind,
            cache_store = ?config.cache_store_kind,
            providers = ?providers.enabled(),
            "Auth registry initialized"
        );

        Ok(Self::new(config, users, cache, providers)?)
    }

    /// Everything in process memory; used by tests and local experiments.
    pub fn in_memory(providers: ProviderRegistry) -> Result<Self, InitError> {
        let config = AuthConfig {
            data_store_kind: DataStoreKind::Memory,
            cache_store_kind: CacheStoreKind::Memory,
            ..AuthConfig::default()
        };
        Ok(Self::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Box::new(InMemoryCacheStore::new()),
            providers,
        )?)
    }

    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore>,
        cache: Box<dyn CacheStore>,
        providers: ProviderRegistry,
    ) -> Result<Self, ProviderError> {
        let cache: SharedCacheStore = Arc::new(Mutex::new(cache));
        let oauth2 = OAuth2Client::new(
            cache.clone(),
            config.csrf_cookie_name.clone(),
            config.csrf_cookie_max_age,
        )?;
        let sessions = SessionManager::new(cache, config.session.clone());

        Ok(Self {
            config,
            users,
            sessions,
            providers,
            oauth2,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn oauth2(&self) -> &OAuth2Client {
        &self.oauth2
    }
}
