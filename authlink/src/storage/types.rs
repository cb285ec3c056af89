use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::cache_store::CacheStore;

/// Data stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheData {
    pub value: String,
}

/// Cache store handle shared by sessions and the OAuth2 state records.
pub type SharedCacheStore = Arc<Mutex<Box<dyn CacheStore>>>;
