use sqlx::{Pool, Sqlite};

use crate::storage::validate_sqlite_table_schema;
use crate::userdb::{
    errors::UserError,
    types::{User, UserSearchField},
};

use super::store_type::{ProviderRow, TokenRow, UserRow, UserTables, assemble_user};

pub(super) async fn create_tables_sqlite(
    pool: &Pool<Sqlite>,
    tables: &UserTables,
) -> Result<(), UserError> {
    let UserTables {
        users,
        providers,
        tokens,
    } = tables;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users} (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT,
            profile TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {providers} (
            user_id TEXT NOT NULL REFERENCES {users}(id),
            provider TEXT NOT NULL,
            provider_user_id TEXT NOT NULL,
            PRIMARY KEY (provider, provider_user_id),
            UNIQUE (user_id, provider)
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {tokens} (
            user_id TEXT NOT NULL REFERENCES {users}(id),
            position INTEGER NOT NULL,
            kind TEXT NOT NULL,
            access_token TEXT NOT NULL,
            token_secret TEXT,
            PRIMARY KEY (user_id, position)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_user_tables_sqlite(
    pool: &Pool<Sqlite>,
    tables: &UserTables,
) -> Result<(), UserError> {
    validate_sqlite_table_schema(
        pool,
        &tables.users,
        &[
            ("id", "TEXT"),
            ("email", "TEXT"),
            ("password", "TEXT"),
            ("profile", "TEXT"),
            ("created_at", "TIMESTAMP"),
            ("updated_at", "TIMESTAMP"),
        ],
        UserError::Storage,
    )
    .await?;

    validate_sqlite_table_schema(
        pool,
        &tables.providers,
        &[
            ("user_id", "TEXT"),
            ("provider", "TEXT"),
            ("provider_user_id", "TEXT"),
        ],
        UserError::Storage,
    )
    .await?;

    validate_sqlite_table_schema(
        pool,
        &tables.tokens,
        &[
            ("user_id", "TEXT"),
            ("position", "INTEGER"),
            ("kind", "TEXT"),
            ("access_token", "TEXT"),
            ("token_secret", "TEXT"),
        ],
        UserError::Storage,
    )
    .await
}

pub(super) async fn get_user_by_field_sqlite(
    pool: &Pool<Sqlite>,
    tables: &UserTables,
    field: &UserSearchField,
) -> Result<Option<User>, UserError> {
    let users = &tables.users;

    let row = match field {
        UserSearchField::Id(id) => {
            sqlx::query_as::<_, UserRow>(&format!("SELECT * FROM {users} WHERE id = ?"))
                .bind(id)
                .fetch_optional(pool)
                .await?
        }
        UserSearchField::Email(email) => {
            sqlx::query_as::<_, UserRow>(&format!("SELECT * FROM {users} WHERE email = ?"))
                .bind(email.trim().to_lowercase())
                .fetch_optional(pool)
                .await?
        }
        UserSearchField::Provider(kind, provider_user_id) => {
            let providers = &tables.providers;
            sqlx::query_as::<_, UserRow>(&format!(
                r#"
                SELECT u.* FROM {users} u
                JOIN {providers} p ON p.user_id = u.id
                WHERE p.provider = ? AND p.provider_user_id = ?
                "#
            ))
            .bind(kind.as_str())
            .bind(provider_user_id)
            .fetch_optional(pool)
            .await?
        }
    };

    let Some(row) = row else {
        return Ok(None);
    };

    let provider_rows = sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT provider, provider_user_id FROM {} WHERE user_id = ?",
        tables.providers
    ))
    .bind(&row.id)
    .fetch_all(pool)
    .await?;

    let token_rows = sqlx::query_as::<_, TokenRow>(&format!(
        "SELECT kind, access_token, token_secret FROM {} WHERE user_id = ? ORDER BY position ASC",
        tables.tokens
    ))
    .bind(&row.id)
    .fetch_all(pool)
    .await?;

    assemble_user(row, provider_rows, token_rows).map(Some)
}

/// Replace the user record, its provider links and its tokens in one transaction.
pub(super) async fn save_user_sqlite(
    pool: &Pool<Sqlite>,
    tables: &UserTables,
    user: &User,
) -> Result<(), UserError> {
    let UserTables {
        users,
        providers,
        tokens,
    } = tables;
    let profile = serde_json::to_string(&user.profile)?;

    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {users} (id, email, password, profile, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            email = excluded.email,
            password = excluded.password,
            profile = excluded.profile,
            updated_at = excluded.updated_at
        "#
    ))
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&profile)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!("DELETE FROM {providers} WHERE user_id = ?"))
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;

    for (kind, provider_user_id) in user.providers.linked() {
        sqlx::query(&format!(
            "INSERT INTO {providers} (user_id, provider, provider_user_id) VALUES (?, ?, ?)"
        ))
        .bind(&user.id)
        .bind(kind.as_str())
        .bind(provider_user_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(&format!("DELETE FROM {tokens} WHERE user_id = ?"))
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;

    for (position, token) in user.tokens.iter().enumerate() {
        sqlx::query(&format!(
            r#"
            INSERT INTO {tokens} (user_id, position, kind, access_token, token_secret)
            VALUES (?, ?, ?, ?, ?)
            "#
        ))
        .bind(&user.id)
        .bind(position as i64)
        .bind(token.kind.as_str())
        .bind(&token.access_token)
        .bind(&token.token_secret)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
