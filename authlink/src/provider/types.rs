use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::CacheData;
use crate::userdb::ProviderKind;

use super::errors::ProviderError;

/// Provider profile normalized from the provider's own payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub provider: ProviderKind,
    pub id: String,
    pub handle: Option<String>,
    pub display_name: String,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub access_token: String,
    pub token_secret: Option<String>,
}

/// Result of a completed provider handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallback {
    pub profile: ProviderProfile,
    pub credentials: ProviderCredentials,
}

/// Query parameters of the redirect back from the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    pub code: Option<String>,
    #[serde(default)]
    pub state: String,
    pub error: Option<String>,
}

/// Single-use record tying an authorization request to its browser and provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredState {
    pub(super) provider: ProviderKind,
    pub(super) csrf_token: String,
    pub(super) pkce_verifier: String,
    pub(super) expires_at: DateTime<Utc>,
    pub(super) ttl: u64,
}

impl TryFrom<StoredState> for CacheData {
    type Error = ProviderError;

    fn try_from(state: StoredState) -> Result<Self, Self::Error> {
        Ok(Self {
            value: serde_json::to_string(&state)?,
        })
    }
}

impl TryFrom<CacheData> for StoredState {
    type Error = ProviderError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        Ok(serde_json::from_str(&data.value)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) token_type: Option<String>,
}
