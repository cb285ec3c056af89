use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage::DataStore;
use crate::userdb::errors::UserError;
use crate::userdb::types::{AccessToken, Profile, ProviderIds, User, UserSearchField};

use super::UserStore;
use super::postgres::*;
use super::sqlite::*;

/// Table names derived from `DB_TABLE_PREFIX`.
#[derive(Debug, Clone)]
pub(super) struct UserTables {
    pub(super) users: String,
    pub(super) providers: String,
    pub(super) tokens: String,
}

impl UserTables {
    fn new(prefix: &str) -> Self {
        Self {
            users: format!("{prefix}users"),
            providers: format!("{prefix}user_providers"),
            tokens: format!("{prefix}user_tokens"),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    pub(super) id: String,
    pub(super) email: String,
    pub(super) password: Option<String>,
    pub(super) profile: String,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
pub(super) struct ProviderRow {
    pub(super) provider: String,
    pub(super) provider_user_id: String,
}

#[derive(sqlx::FromRow)]
pub(super) struct TokenRow {
    pub(super) kind: String,
    pub(super) access_token: String,
    pub(super) token_secret: Option<String>,
}

pub(super) fn assemble_user(
    row: UserRow,
    provider_rows: Vec<ProviderRow>,
    token_rows: Vec<TokenRow>,
) -> Result<User, UserError> {
    let profile: Profile = serde_json::from_str(&row.profile)?;

    let mut providers = ProviderIds::default();
    for p in provider_rows {
        providers.set(p.provider.parse()?, Some(p.provider_user_id));
    }

    let tokens = token_rows
        .into_iter()
        .map(|t| {
            Ok(AccessToken {
                kind: t.kind.parse()?,
                access_token: t.access_token,
                token_secret: t.token_secret,
            })
        })
        .collect::<Result<Vec<_>, UserError>>()?;

    Ok(User {
        id: row.id,
        email: row.email,
        password: row.password,
        providers,
        profile,
        tokens,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// User store backed by SQLite or PostgreSQL.
///
/// Provider ids live in their own table keyed by `(provider, provider_user_id)`,
/// so two records can never claim the same provider identity.
pub struct SqlUserStore {
    store: Box<dyn DataStore>,
    tables: UserTables,
}

impl SqlUserStore {
    pub fn new(store: Box<dyn DataStore>, table_prefix: &str) -> Self {
        Self {
            store,
            tables: UserTables::new(table_prefix),
        }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn init(&self) -> Result<(), UserError> {
        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool, &self.tables).await?;
                validate_user_tables_sqlite(pool, &self.tables).await?;
                Ok(())
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool, &self.tables).await?;
                validate_user_tables_postgres(pool, &self.tables).await?;
                Ok(())
            }
            _ => Err(UserError::Storage("Unsupported database type".to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(user_field = %field))]
    async fn find_one(&self, field: &UserSearchField) -> Result<Option<User>, UserError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            get_user_by_field_sqlite(pool, &self.tables, field).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_user_by_field_postgres(pool, &self.tables, field).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        };

        match &result {
            Ok(found) => tracing::debug!(found = found.is_some(), "User lookup completed"),
            Err(e) => tracing::error!(error = %e, "User lookup failed"),
        }

        result
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save(&self, mut user: User) -> Result<User, UserError> {
        user.email = user.email.trim().to_lowercase();
        user.updated_at = Utc::now();

        let result = if let Some(pool) = self.store.as_sqlite() {
            save_user_sqlite(pool, &self.tables, &user).await
        } else if let Some(pool) = self.store.as_postgres() {
            save_user_postgres(pool, &self.tables, &user).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        };

        match &result {
            Ok(()) => tracing::info!("User saved"),
            Err(UserError::Conflict(msg)) => tracing::debug!("User save conflict: {}", msg),
            Err(e) => tracing::error!(error = %e, "User save failed"),
        }

        result.map(|()| user)
    }
}
