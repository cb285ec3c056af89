use crate::session::FlashMessage;
use crate::userdb::{ProviderKind, User, UserError, UserSearchField, UserStore};
use crate::utils::gen_random_string;

use super::errors::CoordinationError;

const MIN_PASSWORD_LEN: usize = 4;

/// Fields editable on the account page.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: String,
    pub name: String,
    pub gender: String,
    pub location: String,
    pub website: String,
}

pub(super) async fn gen_new_user_id(users: &dyn UserStore) -> Result<String, CoordinationError> {
    for _ in 0..3 {
        let id = gen_random_string(32)?;

        match users.find_by_id(&id).await? {
            None => return Ok(id),
            Some(_) => continue,
        }
    }

    Err(CoordinationError::Store(UserError::Storage(
        "Failed to generate a unique user ID after multiple attempts".to_string(),
    ))
    .log())
}

fn validate_email(email: &str) -> Result<String, CoordinationError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(CoordinationError::Validation("Please enter a valid email address.".to_string()).log())
    }
}

fn validate_password(password: &str, confirm: &str) -> Result<(), CoordinationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoordinationError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        ))
        .log());
    }
    if password != confirm {
        return Err(CoordinationError::Validation("Passwords do not match.".to_string()).log());
    }
    Ok(())
}

async fn load_user(users: &dyn UserStore, user_id: &str) -> Result<User, CoordinationError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| CoordinationError::Unauthorized.log())
}

/// Save, reporting a unique-email clash as `EmailTaken`.
async fn save_with_email(users: &dyn UserStore, user: User) -> Result<User, CoordinationError> {
    let email = user.email.clone();
    match users.save(user).await {
        Ok(user) => Ok(user),
        Err(UserError::Conflict(_)) => Err(CoordinationError::EmailTaken(email).log()),
        Err(e) => Err(e.into()),
    }
}

/// Create an account with a local password.
#[tracing::instrument(skip(users, password, confirm))]
pub async fn register_local_user(
    users: &dyn UserStore,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<User, CoordinationError> {
    let email = validate_email(email)?;
    validate_password(password, confirm)?;

    if users
        .find_one(&UserSearchField::Email(email.clone()))
        .await?
        .is_some()
    {
        return Err(CoordinationError::EmailTaken(email).log());
    }

    let mut user = User::new(gen_new_user_id(users).await?, &email);
    user.set_password(password)?;
    let user = save_with_email(users, user).await?;

    tracing::info!(user_id = %user.id, "Local user registered");
    Ok(user)
}

#[tracing::instrument(skip(users, update))]
pub async fn update_profile(
    users: &dyn UserStore,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<(User, FlashMessage), CoordinationError> {
    let email = validate_email(&update.email)?;
    let mut user = load_user(users, user_id).await?;

    if email != user.email {
        if let Some(owner) = users
            .find_one(&UserSearchField::Email(email.clone()))
            .await?
        {
            if owner.id != user.id {
                return Err(CoordinationError::EmailTaken(email).log());
            }
        }
    }

    user.email = email;
    user.profile.name = update.name.trim().to_string();
    user.profile.gender = update.gender.trim().to_string();
    user.profile.location = update.location.trim().to_string();
    user.profile.website = update.website.trim().to_string();

    let user = save_with_email(users, user).await?;
    Ok((user, FlashMessage::success("Profile information has been updated.")))
}

#[tracing::instrument(skip(users, password, confirm))]
pub async fn change_password(
    users: &dyn UserStore,
    user_id: &str,
    password: &str,
    confirm: &str,
) -> Result<(User, FlashMessage), CoordinationError> {
    validate_password(password, confirm)?;
    let mut user = load_user(users, user_id).await?;
    user.set_password(password)?;
    let user = users.save(user).await?;
    Ok((user, FlashMessage::success("Password has been changed.")))
}

/// Forget the provider id and every token of that provider.
#[tracing::instrument(skip(users))]
pub async fn unlink_provider(
    users: &dyn UserStore,
    user_id: &str,
    kind: ProviderKind,
) -> Result<(User, FlashMessage), CoordinationError> {
    let mut user = load_user(users, user_id).await?;
    user.providers.set(kind, None);
    user.tokens.retain(|token| token.kind != kind);
    let user = users.save(user).await?;
    Ok((
        user,
        FlashMessage::info(format!("{} account has been unlinked.", kind.display_name())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;
    use crate::test_utils::{CountingUserStore, local_user};
    use crate::userdb::AccessToken;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_register_local_user() {
        // Given an empty store
        let users = CountingUserStore::new();

        // When registering with a mixed-case email
        let user = register_local_user(&users, "New@Example.com", "pass1", "pass1")
            .await
            .unwrap();

        // Then the email is lower-cased and the password hashed
        assert_eq!(user.email, "new@example.com");
        assert!(user.compare_password("pass1"));
        assert_ne!(user.password.as_deref(), Some("pass1"));
        assert_eq!(user.id.len(), 43);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let users = CountingUserStore::new();
        users.insert(local_user("u1", "taken@example.com", "pw")).await;

        let err = register_local_user(&users, "TAKEN@example.com", "pass1", "pass1")
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinationError::EmailTaken(_)));
        assert_eq!(users.saves(), 0);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let users = CountingUserStore::new();

        let short = register_local_user(&users, "a@example.com", "abc", "abc").await;
        let mismatch = register_local_user(&users, "a@example.com", "abcd", "abce").await;
        let bad_email = register_local_user(&users, "not-an-email", "abcd", "abcd").await;

        assert_eq!(
            short.unwrap_err().to_string(),
            "Password must be at least 4 characters long."
        );
        assert_eq!(mismatch.unwrap_err().to_string(), "Passwords do not match.");
        assert_eq!(
            bad_email.unwrap_err().to_string(),
            "Please enter a valid email address."
        );
        assert_eq!(users.saves(), 0);
    }

    #[tokio::test]
    async fn test_update_profile() {
        // Given a user
        let users = CountingUserStore::new();
        users.insert(local_user("u1", "old@example.com", "pw")).await;

        // When updating email and profile
        let (user, flash) = update_profile(
            &users,
            "u1",
            ProfileUpdate {
                email: "New@Example.com".to_string(),
                name: " Ada ".to_string(),
                gender: "female".to_string(),
                location: "London".to_string(),
                website: "https://ada.example".to_string(),
            },
        )
        .await
        .unwrap();

        // Then the record is updated
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.profile.name, "Ada");
        assert_eq!(user.profile.website, "https://ada.example");
        assert_eq!(flash.level, FlashLevel::Success);
        assert!(user.compare_password("pw"));
    }

    #[tokio::test]
    async fn test_update_profile_email_taken() {
        let users = CountingUserStore::new();
        users.insert(local_user("u1", "me@example.com", "pw")).await;
        users.insert(local_user("u2", "you@example.com", "pw")).await;

        let err = update_profile(
            &users,
            "u1",
            ProfileUpdate {
                email: "you@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoordinationError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let users = CountingUserStore::new();
        users.insert(local_user("u1", "me@example.com", "old1")).await;

        change_password(&users, "u1", "new1", "new1").await.unwrap();

        let stored = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(stored.compare_password("new1"));
        assert!(!stored.compare_password("old1"));
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let users = CountingUserStore::new();
        let err = change_password(&users, "ghost", "new1", "new1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Unauthorized));
    }

    #[tokio::test]
    async fn test_unlink_provider_removes_id_and_tokens() {
        // Given a user with GitHub and Twitter linked
        let users = CountingUserStore::new();
        let mut user = local_user("u1", "me@example.com", "pw");
        for (kind, id) in [(ProviderKind::GitHub, "gh"), (ProviderKind::Twitter, "tw")] {
            user.providers.set(kind, Some(id.to_string()));
            user.tokens.push(AccessToken {
                kind,
                access_token: format!("{id}-token"),
                token_secret: None,
            });
        }
        users.insert(user).await;

        // When unlinking GitHub
        let (user, flash) = unlink_provider(&users, "u1", ProviderKind::GitHub)
            .await
            .unwrap();

        // Then only the Twitter link remains
        assert_eq!(user.providers.get(ProviderKind::GitHub), None);
        assert_eq!(user.providers.get(ProviderKind::Twitter), Some("tw"));
        assert_eq!(user.tokens.len(), 1);
        assert_eq!(flash.msg, "GitHub account has been unlinked.");
        assert_eq!(flash.level, FlashLevel::Info);
    }

    #[tokio::test]
    async fn test_gen_new_user_id_is_unique() {
        let users = CountingUserStore::new();
        let a = gen_new_user_id(&users).await.unwrap();
        let b = gen_new_user_id(&users).await.unwrap();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_valid_emails_are_lowercased(local in "[A-Za-z0-9._]{1,12}", domain in "[A-Za-z]{1,10}\\.[A-Za-z]{2,4}") {
            let email = format!("{local}@{domain}");
            let normalized = validate_email(&email).unwrap();
            prop_assert_eq!(normalized, email.to_lowercase());
        }

        #[test]
        fn prop_emails_without_at_are_rejected(s in "[A-Za-z0-9.]{0,20}") {
            prop_assert!(validate_email(&s).is_err());
        }
    }
}
