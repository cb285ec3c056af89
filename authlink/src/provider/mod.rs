mod adapters;
mod config;
mod errors;
mod oauth2;
mod types;

pub use adapters::{ProviderAdapter, adapter_for};
pub use config::{ProviderConfig, ProviderRegistry, TokenAuthMethod};
pub use errors::ProviderError;
pub use oauth2::OAuth2Client;
pub use types::{AuthResponse, ProviderCallback, ProviderCredentials, ProviderProfile};
