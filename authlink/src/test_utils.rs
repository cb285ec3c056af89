//! Test helpers shared by the unit tests of this crate.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::provider::{ProviderCallback, ProviderCredentials, ProviderProfile};
use crate::userdb::{
    InMemoryUserStore, ProviderKind, User, UserError, UserSearchField, UserStore, hash_password,
};

/// In-memory user store that counts writes and can simulate faults or a
/// concurrent writer.
pub(crate) struct CountingUserStore {
    inner: InMemoryUserStore,
    saves: AtomicUsize,
    failing: AtomicBool,
    concurrent_write: Mutex<Option<User>>,
}

impl CountingUserStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemoryUserStore::new(),
            saves: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            concurrent_write: Mutex::new(None),
        }
    }

    /// Every operation fails with a storage error.
    pub(crate) fn failing() -> Self {
        let store = Self::new();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    /// Store a record without counting it as a write.
    pub(crate) async fn insert(&self, user: User) -> User {
        self.inner.save(user).await.expect("seed user")
    }

    /// Number of successful `save` calls.
    pub(crate) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) async fn count(&self) -> usize {
        self.inner.len().await
    }

    /// Write `user` right before the next `save` runs, as another request would.
    pub(crate) fn write_before_next_save(&self, user: User) {
        *self.concurrent_write.lock().unwrap() = Some(user);
    }

    fn check(&self) -> Result<(), UserError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UserError::Storage("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for CountingUserStore {
    async fn init(&self) -> Result<(), UserError> {
        self.check()
    }

    async fn find_one(&self, field: &UserSearchField) -> Result<Option<User>, UserError> {
        self.check()?;
        self.inner.find_one(field).await
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        self.check()?;
        let concurrent = self.concurrent_write.lock().unwrap().take();
        if let Some(other) = concurrent {
            self.inner.save(other).await?;
        }
        let saved = self.inner.save(user).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(saved)
    }
}

pub(crate) fn local_user(id: &str, email: &str, password: &str) -> User {
    let mut user = User::new(id, email);
    user.password = Some(hash_password(password).expect("hash password"));
    user
}

pub(crate) fn callback(kind: ProviderKind, id: &str, handle: Option<&str>) -> ProviderCallback {
    ProviderCallback {
        profile: ProviderProfile {
            provider: kind,
            id: id.to_string(),
            handle: handle.map(str::to_string),
            display_name: format!("Display {id}"),
            location: Some("Tokyo".to_string()),
            avatar_url: Some(format!("https://img.example/{id}.png")),
        },
        credentials: ProviderCredentials {
            access_token: format!("token-{id}"),
            token_secret: Some(format!("secret-{id}")),
        },
    }
}
