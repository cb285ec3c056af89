//! authlink - local accounts, provider sign-in and account linking
//!
//! The crate owns the user store, the session and flash store, the OAuth2
//! handshake and the coordination rules that decide what a provider callback
//! does to the user table. [`AuthRegistry`] ties them together for a web layer.

mod config;
mod coordination;
mod guards;
mod provider;
mod registry;
mod session;
mod storage;
mod userdb;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{AuthConfig, ConfigError};
pub use registry::{AuthRegistry, InitError};

pub use coordination::{
    CoordinationError, LinkAction, LinkOutcome, ProfileUpdate, change_password,
    register_local_user, resolve_provider_callback, unlink_provider, update_profile,
    verify_credentials,
};

pub use guards::{is_authorized, is_return_to_path, provider_from_path};

pub use provider::{
    AuthResponse, OAuth2Client, ProviderAdapter, ProviderCallback, ProviderConfig,
    ProviderCredentials, ProviderError, ProviderProfile, ProviderRegistry, TokenAuthMethod,
    adapter_for,
};

pub use session::{
    Flash, FlashLevel, FlashMessage, SessionConfig, SessionError, SessionLogin, SessionManager,
};

pub use storage::{
    CacheData, CacheStore, CacheStoreKind, DataStore, DataStoreKind, InMemoryCacheStore,
    StorageError,
};

pub use userdb::{
    AccessToken, InMemoryUserStore, Profile, ProviderIds, ProviderKind, SqlUserStore, User,
    UserError, UserSearchField, UserStore, hash_password,
};

pub use utils::{UtilError, gen_random_string, get_cookie_value};
