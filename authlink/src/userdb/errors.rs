use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    /// A unique email or provider id is already taken by another record.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<serde_json::Error> for UserError {
    fn from(err: serde_json::Error) -> Self {
        UserError::InvalidData(err.to_string())
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                UserError::Conflict(db_err.message().to_string())
            }
            _ => UserError::Storage(err.to_string()),
        }
    }
}

impl From<crate::storage::StorageError> for UserError {
    fn from(err: crate::storage::StorageError) -> Self {
        UserError::Storage(err.to_string())
    }
}
