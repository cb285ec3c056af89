mod memory;
mod postgres;
mod sqlite;
mod store_type;

use async_trait::async_trait;

use crate::userdb::errors::UserError;
use crate::userdb::types::{User, UserSearchField};

pub use memory::InMemoryUserStore;
pub use store_type::SqlUserStore;

/// Persistence contract for user records.
///
/// `save` inserts or replaces the record with the same id. It fails with
/// [`UserError::Conflict`] when the email or any linked provider id already
/// belongs to a different record.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Create tables or other backing structures. Safe to call repeatedly.
    async fn init(&self) -> Result<(), UserError>;

    async fn find_one(&self, field: &UserSearchField) -> Result<Option<User>, UserError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, UserError> {
        self.find_one(&UserSearchField::Id(id.to_string())).await
    }

    async fn save(&self, user: User) -> Result<User, UserError>;
}
