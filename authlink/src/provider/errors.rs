use thiserror::Error;

use crate::userdb::ProviderKind;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("Provider {0} is not configured")]
    NotConfigured(ProviderKind),

    #[error("Authorization denied by provider: {0}")]
    Denied(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Security token not found: {0}")]
    SecurityTokenNotFound(String),

    #[error("Csrf token mismatch")]
    CsrfTokenMismatch,

    #[error("Csrf token expired")]
    CsrfTokenExpired,

    #[error("State was issued for {expected}, not {actual}")]
    ProviderMismatch {
        expected: ProviderKind,
        actual: ProviderKind,
    },

    #[error("Token exchange error: {0}")]
    TokenExchange(String),

    #[error("Fetch user info error: {0}")]
    FetchUserInfo(String),

    #[error("Invalid profile payload: {0}")]
    InvalidProfile(String),

    #[error("Http client error: {0}")]
    HttpClient(String),

    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<crate::storage::StorageError> for ProviderError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
