use http::header::HeaderMap;

use crate::guards::is_return_to_path;
use crate::storage::{CacheData, SharedCacheStore};
use crate::userdb::{User, UserStore};
use crate::utils::{gen_random_string, get_cookie_value, header_set_cookie};

use super::config::SessionConfig;
use super::errors::SessionError;
use super::types::{FlashMessage, StoredSession};

const SESSION_PREFIX: &str = "session";

/// Outcome of a successful login.
#[derive(Debug)]
pub struct SessionLogin {
    /// `Set-Cookie` for the renewed session id.
    pub headers: HeaderMap,
    /// Destination remembered before login, consumed by this login.
    pub return_to: Option<String>,
}

/// Cookie-addressed server-side sessions kept in the cache store.
pub struct SessionManager {
    cache: SharedCacheStore,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(cache: SharedCacheStore, config: SessionConfig) -> Self {
        Self { cache, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn session_id<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        get_cookie_value(headers, &self.config.cookie_name)
    }

    /// Load a session, dropping it when expired or unreadable.
    async fn load(&self, session_id: &str) -> Result<Option<StoredSession>, SessionError> {
        let mut cache = self.cache.lock().await;
        let Some(data) = cache.get(SESSION_PREFIX, session_id).await? else {
            return Ok(None);
        };

        let session = match StoredSession::try_from(data) {
            Ok(session) if !session.is_expired() => session,
            Ok(session) => {
                tracing::debug!("Session expired at {}", session.expires_at);
                cache.remove(SESSION_PREFIX, session_id).await?;
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                cache.remove(SESSION_PREFIX, session_id).await?;
                return Ok(None);
            }
        };
        Ok(Some(session))
    }

    async fn store(&self, session_id: &str, session: &StoredSession) -> Result<(), SessionError> {
        let data = CacheData::try_from(session)?;
        self.cache
            .lock()
            .await
            .put_with_ttl(
                SESSION_PREFIX,
                session_id,
                data,
                session.remaining_ttl() as usize,
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<(), SessionError> {
        self.cache
            .lock()
            .await
            .remove(SESSION_PREFIX, session_id)
            .await?;
        Ok(())
    }

    /// Store `session` under a fresh id and return the cookie pointing at it.
    async fn create(&self, session: &StoredSession) -> Result<HeaderMap, SessionError> {
        let session_id = gen_random_string(32)?;
        self.store(&session_id, session).await?;

        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            &self.config.cookie_name,
            &session_id,
            self.config.max_age as i64,
        )?;
        Ok(headers)
    }

    /// Apply `update` to the current session, creating an anonymous one when absent.
    /// Returns the `Set-Cookie` headers of a newly created session, otherwise empty headers.
    async fn update_or_create(
        &self,
        headers: &HeaderMap,
        update: impl FnOnce(&mut StoredSession),
    ) -> Result<HeaderMap, SessionError> {
        if let Some(session_id) = self.session_id(headers) {
            if let Some(mut session) = self.load(session_id).await? {
                update(&mut session);
                self.store(session_id, &session).await?;
                return Ok(HeaderMap::new());
            }
        }

        let mut session = StoredSession::new(None, self.config.max_age);
        update(&mut session);
        self.create(&session).await
    }

    /// Bind `user_id` to a new session id. Pending flash messages move to the
    /// new session; the previous session is deleted.
    pub async fn login(
        &self,
        headers: &HeaderMap,
        user_id: &str,
    ) -> Result<SessionLogin, SessionError> {
        self.login_with_flash(headers, user_id, Vec::new()).await
    }

    /// Same as [`login`](Self::login), queueing `flash` on the new session.
    #[tracing::instrument(skip(self, headers, flash))]
    pub async fn login_with_flash(
        &self,
        headers: &HeaderMap,
        user_id: &str,
        flash: Vec<FlashMessage>,
    ) -> Result<SessionLogin, SessionError> {
        let previous = match self.session_id(headers) {
            Some(session_id) => {
                let previous = self.load(session_id).await?;
                self.remove(session_id).await?;
                previous
            }
            None => None,
        };

        let mut session = StoredSession::new(Some(user_id.to_string()), self.config.max_age);
        let mut return_to = None;
        if let Some(previous) = previous {
            session.flash = previous.flash;
            return_to = previous.return_to;
        }
        session.flash.extend(flash);

        let headers = self.create(&session).await?;
        tracing::debug!("Created session for user");
        Ok(SessionLogin { headers, return_to })
    }

    pub async fn current_user_id(&self, headers: &HeaderMap) -> Result<Option<String>, SessionError> {
        let Some(session_id) = self.session_id(headers) else {
            return Ok(None);
        };
        Ok(self
            .load(session_id)
            .await?
            .and_then(|session| session.user_id))
    }

    /// Resolve the signed-in user. A session pointing at a missing user counts as signed out.
    pub async fn current_user(
        &self,
        headers: &HeaderMap,
        users: &dyn UserStore,
    ) -> Result<Option<User>, SessionError> {
        let Some(user_id) = self.current_user_id(headers).await? else {
            return Ok(None);
        };
        let user = users.find_by_id(&user_id).await?;
        if user.is_none() {
            tracing::warn!("Session refers to unknown user {}", user_id);
        }
        Ok(user)
    }

    pub async fn push_flash(
        &self,
        headers: &HeaderMap,
        message: FlashMessage,
    ) -> Result<HeaderMap, SessionError> {
        self.update_or_create(headers, |session| session.flash.push(message)).await
    }

    /// Remove and return all pending flash messages.
    pub async fn take_flash(&self, headers: &HeaderMap) -> Result<Vec<FlashMessage>, SessionError> {
        let Some(session_id) = self.session_id(headers) else {
            return Ok(Vec::new());
        };
        let Some(mut session) = self.load(session_id).await? else {
            return Ok(Vec::new());
        };
        if session.flash.is_empty() {
            return Ok(Vec::new());
        }

        let flash = std::mem::take(&mut session.flash);
        self.store(session_id, &session).await?;
        Ok(flash)
    }

    /// Remember `path` as the post-login destination when it is one worth returning to.
    pub async fn remember_return_to(
        &self,
        headers: &HeaderMap,
        path: &str,
    ) -> Result<HeaderMap, SessionError> {
        if !is_return_to_path(path) {
            return Ok(HeaderMap::new());
        }
        let path = path.to_string();
        self.update_or_create(headers, |session| session.return_to = Some(path)).await
    }

    /// Remove and return the remembered destination.
    pub async fn take_return_to(&self, headers: &HeaderMap) -> Result<Option<String>, SessionError> {
        let Some(session_id) = self.session_id(headers) else {
            return Ok(None);
        };
        let Some(mut session) = self.load(session_id).await? else {
            return Ok(None);
        };
        let return_to = session.return_to.take();
        if return_to.is_some() {
            self.store(session_id, &session).await?;
        }
        Ok(return_to)
    }

    /// Delete the session and expire its cookie.
    #[tracing::instrument(skip(self, headers))]
    pub async fn logout(&self, headers: &HeaderMap) -> Result<HeaderMap, SessionError> {
        if let Some(session_id) = self.session_id(headers) {
            self.remove(session_id).await?;
        }

        let mut response_headers = HeaderMap::new();
        header_set_cookie(&mut response_headers, &self.config.cookie_name, "", 0)?;
        Ok(response_headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::FlashLevel;
    use crate::storage::{CacheStore, InMemoryCacheStore};
    use crate::userdb::InMemoryUserStore;
    use chrono::{Duration, Utc};
    use http::header::{COOKIE, HeaderValue, SET_COOKIE};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn manager() -> (SessionManager, SharedCacheStore) {
        let cache: SharedCacheStore =
            Arc::new(Mutex::new(Box::new(InMemoryCacheStore::new()) as Box<dyn CacheStore>));
        let manager = SessionManager::new(cache.clone(), SessionConfig::default());
        (manager, cache)
    }

    /// Turn a `Set-Cookie` response into the `Cookie` header of the next request.
    fn follow(set_cookie: &HeaderMap) -> HeaderMap {
        let value = set_cookie.get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = value.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_login_then_current_user() {
        // Given a stored user
        let (sessions, _) = manager();
        let users = InMemoryUserStore::new();
        users.save(User::new("u1", "a@example.com")).await.unwrap();

        // When logging in
        let login = sessions.login(&HeaderMap::new(), "u1").await.unwrap();
        let request = follow(&login.headers);

        // Then the session resolves to the user
        let user = sessions.current_user(&request, &users).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let (sessions, _) = manager();
        let users = InMemoryUserStore::new();
        let user = sessions.current_user(&HeaderMap::new(), &users).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_login_renews_session_and_keeps_flash_and_return_to() {
        // Given an anonymous session with a flash message and a return path
        let (sessions, _) = manager();
        let created = sessions
            .push_flash(&HeaderMap::new(), FlashMessage::info("hello"))
            .await
            .unwrap();
        let anonymous = follow(&created);
        sessions
            .remember_return_to(&anonymous, "/api/github")
            .await
            .unwrap();

        // When logging in
        let login = sessions.login(&anonymous, "u1").await.unwrap();

        // Then the return path is handed back and the old id is dead
        assert_eq!(login.return_to.as_deref(), Some("/api/github"));
        assert_eq!(sessions.current_user_id(&anonymous).await.unwrap(), None);

        // And the flash message moved to the new session
        let renewed = follow(&login.headers);
        assert_ne!(renewed, anonymous);
        let flash = sessions.take_flash(&renewed).await.unwrap();
        assert_eq!(flash, vec![FlashMessage::info("hello")]);
    }

    #[tokio::test]
    async fn test_login_with_flash_appends_after_carried_messages() {
        let (sessions, _) = manager();
        let created = sessions
            .push_flash(&HeaderMap::new(), FlashMessage::info("first"))
            .await
            .unwrap();

        let login = sessions
            .login_with_flash(
                &follow(&created),
                "u1",
                vec![FlashMessage::success("Success! You are logged in.")],
            )
            .await
            .unwrap();

        let flash = sessions.take_flash(&follow(&login.headers)).await.unwrap();
        assert_eq!(
            flash,
            vec![
                FlashMessage::info("first"),
                FlashMessage::success("Success! You are logged in."),
            ]
        );
    }

    #[tokio::test]
    async fn test_take_return_to_is_single_use() {
        // Given a signed-in session that remembered an api path
        let (sessions, _) = manager();
        let login = sessions.login(&HeaderMap::new(), "u1").await.unwrap();
        let request = follow(&login.headers);
        sessions
            .remember_return_to(&request, "/api/twitter")
            .await
            .unwrap();

        // When taking it twice
        let first = sessions.take_return_to(&request).await.unwrap();
        let second = sessions.take_return_to(&request).await.unwrap();

        // Then only the first call sees it and the user stays signed in
        assert_eq!(first.as_deref(), Some("/api/twitter"));
        assert_eq!(second, None);
        assert_eq!(
            sessions.current_user_id(&request).await.unwrap().as_deref(),
            Some("u1")
        );
    }

    #[tokio::test]
    async fn test_push_flash_on_existing_session_sets_no_cookie() {
        let (sessions, _) = manager();
        let login = sessions.login(&HeaderMap::new(), "u1").await.unwrap();
        let request = follow(&login.headers);

        let headers = sessions
            .push_flash(&request, FlashMessage::errors("nope"))
            .await
            .unwrap();

        assert!(headers.is_empty());
        assert_eq!(
            sessions.current_user_id(&request).await.unwrap().as_deref(),
            Some("u1")
        );
    }

    #[tokio::test]
    async fn test_take_flash_drains() {
        // Given two flash messages
        let (sessions, _) = manager();
        let created = sessions
            .push_flash(&HeaderMap::new(), FlashMessage::errors("one"))
            .await
            .unwrap();
        let request = follow(&created);
        sessions
            .push_flash(&request, FlashMessage::success("two"))
            .await
            .unwrap();

        // When taking them twice
        let first = sessions.take_flash(&request).await.unwrap();
        let second = sessions.take_flash(&request).await.unwrap();

        // Then they are delivered once, in order
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].level, FlashLevel::Errors);
        assert_eq!(first[1].msg, "two");
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_remember_return_to_ignores_other_paths() {
        let (sessions, _) = manager();
        let headers = sessions
            .remember_return_to(&HeaderMap::new(), "/login")
            .await
            .unwrap();
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn test_logout_removes_session_and_expires_cookie() {
        // Given a logged in session
        let (sessions, _) = manager();
        let login = sessions.login(&HeaderMap::new(), "u1").await.unwrap();
        let request = follow(&login.headers);

        // When logging out
        let headers = sessions.logout(&request).await.unwrap();

        // Then the cookie is expired and the session gone
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(sessions.current_user_id(&request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        // Given a session whose expiry has passed but is still cached
        let (sessions, cache) = manager();
        let mut stored = StoredSession::new(Some("u1".to_string()), 60);
        stored.expires_at = Utc::now() - Duration::seconds(1);
        cache
            .lock()
            .await
            .put_with_ttl(
                SESSION_PREFIX,
                "stale",
                CacheData::try_from(&stored).unwrap(),
                60,
            )
            .await
            .unwrap();
        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_static("__Host-SessionId=stale"),
        );

        // Then it is treated as absent and deleted
        assert_eq!(sessions.current_user_id(&request).await.unwrap(), None);
        assert!(
            cache
                .lock()
                .await
                .get(SESSION_PREFIX, "stale")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_session_for_deleted_user_is_anonymous() {
        let (sessions, _) = manager();
        let users = InMemoryUserStore::new();
        let login = sessions.login(&HeaderMap::new(), "ghost").await.unwrap();

        let user = sessions
            .current_user(&follow(&login.headers), &users)
            .await
            .unwrap();

        assert!(user.is_none());
    }
}
