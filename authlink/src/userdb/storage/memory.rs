use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::userdb::errors::UserError;
use crate::userdb::types::{User, UserSearchField};

use super::UserStore;

/// User store kept in process memory. Uniqueness is checked under the write lock.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory user store");
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn matches(user: &User, field: &UserSearchField) -> bool {
    match field {
        UserSearchField::Id(id) => &user.id == id,
        UserSearchField::Email(email) => user.email.eq_ignore_ascii_case(email.trim()),
        UserSearchField::Provider(kind, id) => user.providers.get(*kind) == Some(id.as_str()),
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn init(&self) -> Result<(), UserError> {
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_field = %field))]
    async fn find_one(&self, field: &UserSearchField) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        let found = match field {
            UserSearchField::Id(id) => users.get(id).cloned(),
            _ => users.values().find(|user| matches(user, field)).cloned(),
        };
        tracing::debug!(found = found.is_some(), "User lookup completed");
        Ok(found)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save(&self, mut user: User) -> Result<User, UserError> {
        user.email = user.email.trim().to_lowercase();
        user.updated_at = Utc::now();

        let mut users = self.users.write().await;
        for other in users.values().filter(|other| other.id != user.id) {
            if other.email == user.email {
                tracing::debug!("Email already used by another user");
                return Err(UserError::Conflict(format!(
                    "email {} already in use",
                    user.email
                )));
            }
            if let Some((kind, id)) = user
                .providers
                .linked()
                .find(|(kind, id)| other.providers.get(*kind) == Some(*id))
            {
                tracing::debug!(provider = %kind, "Provider id already linked to another user");
                return Err(UserError::Conflict(format!(
                    "{kind} id {id} already linked"
                )));
            }
        }

        users.insert(user.id.clone(), user.clone());
        tracing::info!("User saved");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::types::ProviderKind;

    fn linked_user(id: &str, email: &str, github: &str) -> User {
        let mut user = User::new(id, email);
        user.providers.set(ProviderKind::GitHub, Some(github.to_string()));
        user
    }

    #[tokio::test]
    async fn test_save_and_find_by_each_field() {
        // Given a saved user with a linked GitHub id
        let store = InMemoryUserStore::new();
        store
            .save(linked_user("u1", "Bob@Example.com", "42"))
            .await
            .unwrap();

        // Then it is found by id, by email in any case, and by provider id
        assert!(store.find_by_id("u1").await.unwrap().is_some());
        let by_email = store
            .find_one(&UserSearchField::Email("BOB@example.COM".to_string()))
            .await
            .unwrap();
        assert_eq!(by_email.unwrap().email, "bob@example.com");
        let by_provider = store
            .find_one(&UserSearchField::Provider(
                ProviderKind::GitHub,
                "42".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(by_provider.unwrap().id, "u1");
        assert!(
            store
                .find_one(&UserSearchField::Provider(
                    ProviderKind::Twitter,
                    "42".to_string()
                ))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_save_replaces_same_id() {
        let store = InMemoryUserStore::new();
        let mut user = store.save(User::new("u1", "a@example.com")).await.unwrap();
        user.profile.name = "Alice".to_string();
        store.save(user).await.unwrap();

        assert_eq!(store.len().await, 1);
        let stored = store.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.profile.name, "Alice");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        // Given an existing user
        let store = InMemoryUserStore::new();
        store.save(User::new("u1", "a@example.com")).await.unwrap();

        // When another record claims the same email
        let result = store.save(User::new("u2", "A@EXAMPLE.com")).await;

        // Then the save is rejected
        assert!(matches!(result, Err(UserError::Conflict(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_provider_id_is_conflict() {
        let store = InMemoryUserStore::new();
        store
            .save(linked_user("u1", "a@example.com", "42"))
            .await
            .unwrap();

        let result = store.save(linked_user("u2", "b@example.com", "42")).await;

        assert!(matches!(result, Err(UserError::Conflict(_))));
    }
}
