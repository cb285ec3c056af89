use crate::userdb::{User, UserSearchField, UserStore};

use super::errors::CoordinationError;

/// Check an email and password pair against the stored argon2 hash.
///
/// The email lookup is case-insensitive. An unknown email and a wrong
/// password are reported differently, matching the login form's messages.
#[tracing::instrument(skip(users, password))]
pub async fn verify_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, CoordinationError> {
    let user = users
        .find_one(&UserSearchField::Email(email.trim().to_lowercase()))
        .await?
        .ok_or_else(|| {
            CoordinationError::NotFound {
                email: email.to_string(),
            }
            .log()
        })?;

    if user.compare_password(password) {
        tracing::debug!(user_id = %user.id, "Credentials verified");
        Ok(user)
    } else {
        Err(CoordinationError::InvalidCredentials.log())
    }
}
