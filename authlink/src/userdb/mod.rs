mod errors;
mod password;
mod storage;
mod types;

pub use errors::UserError;
pub use password::hash_password;
pub use storage::{InMemoryUserStore, SqlUserStore, UserStore};
pub use types::{AccessToken, Profile, ProviderIds, ProviderKind, User, UserSearchField};
