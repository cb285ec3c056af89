use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::storage::errors::StorageError;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

/// Backend selected by `GENERIC_DATA_STORE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataStoreKind {
    Memory,
    #[default]
    Sqlite,
    Postgres,
}

impl FromStr for DataStoreKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            t => Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory', 'sqlite' and 'postgres'"
            ))),
        }
    }
}

/// Open a lazily connected SQL pool. `Memory` has no SQL backing and is rejected here.
pub fn open_data_store(kind: DataStoreKind, url: &str) -> Result<Box<dyn DataStore>, StorageError> {
    tracing::info!("Initializing data store with type: {:?}, url: {}", kind, url);

    let store: Box<dyn DataStore> = match kind {
        DataStoreKind::Sqlite => {
            let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            // Every connection to ":memory:" is a separate database.
            let pool_opts = if url.contains(":memory:") {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new().max_connections(5)
            };
            Box::new(SqliteDataStore {
                pool: pool_opts.connect_lazy_with(opts),
            })
        }
        DataStoreKind::Postgres => Box::new(PostgresDataStore {
            pool: sqlx::PgPool::connect_lazy(url)?,
        }),
        DataStoreKind::Memory => {
            return Err(StorageError::Config(
                "The memory store type has no SQL data store".to_string(),
            ));
        }
    };

    Ok(store)
}
