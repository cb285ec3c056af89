use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Response},
};
use http::{Method, StatusCode, request::Parts};

use authlink::{AuthRegistry, User};

use crate::redirect::found;

/// Rejection for requests without a signed-in user.
#[derive(Debug)]
pub struct AuthRedirect {
    method: Method,
    login_url: String,
}

impl AuthRedirect {
    fn new(method: Method, login_url: &str) -> Self {
        Self {
            method,
            login_url: login_url.to_string(),
        }
    }

    fn into_response_with_method(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", self.login_url);
            found(&self.login_url)
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        self.into_response_with_method()
    }
}

/// Signed-in user, available as an Axum extractor
///
/// The user placed in the request extensions by
/// [`is_authenticated`](crate::is_authenticated) is reused; otherwise the
/// session cookie is resolved against the user store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{routing::get, Router};
/// use authlink_axum::{AuthRegistry, AuthUser};
///
/// async fn protected_handler(user: AuthUser) -> String {
///     format!("Hello, {}!", user.email)
/// }
///
/// let app: Router<Arc<AuthRegistry>> = Router::new()
///     .route("/protected", get(protected_handler));
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self { user }
    }
}

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthRegistry>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let registry = Arc::<AuthRegistry>::from_ref(state);
        let rejection = || AuthRedirect::new(parts.method.clone(), &registry.config().login_url);

        match registry
            .sessions()
            .current_user(&parts.headers, registry.users())
            .await
        {
            Ok(Some(user)) => Ok(AuthUser::from(user)),
            Ok(None) => Err(rejection()),
            Err(e) => {
                tracing::error!("Failed to resolve session user: {}", e);
                Err(rejection())
            }
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    Arc<AuthRegistry>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result: Result<Self, Self::Rejection> =
            <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authlink::{ProviderRegistry, UserStore};
    use axum::extract::Request;

    fn parts(method: Method, cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(method).uri("/account");
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_auth_redirect_into_response_with_method() {
        let response = AuthRedirect::new(Method::GET, "/login").into_response_with_method();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/login");

        let response = AuthRedirect::new(Method::POST, "/login").into_response_with_method();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extract_without_session_is_rejected() {
        let registry = Arc::new(AuthRegistry::in_memory(ProviderRegistry::default()).unwrap());
        let mut parts = parts(Method::GET, None);

        let result = <AuthUser as FromRequestParts<_>>::from_request_parts(&mut parts, &registry).await;
        assert!(result.is_err());

        let optional =
            <AuthUser as OptionalFromRequestParts<_>>::from_request_parts(&mut parts, &registry)
                .await
                .unwrap();
        assert!(optional.is_none());
    }

    #[tokio::test]
    async fn test_extract_signed_in_user() {
        // Given a stored user with a live session
        let registry = Arc::new(AuthRegistry::in_memory(ProviderRegistry::default()).unwrap());
        registry
            .users()
            .save(User::new("u1", "a@example.com"))
            .await
            .unwrap();
        let login = registry
            .sessions()
            .login(&http::HeaderMap::new(), "u1")
            .await
            .unwrap();
        let set_cookie = login.headers[http::header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap();

        // When extracting
        let mut parts = parts(Method::GET, Some(cookie));
        let user = <AuthUser as FromRequestParts<_>>::from_request_parts(&mut parts, &registry)
            .await
            .ok()
            .unwrap();

        // Then the user is resolved through the store
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_extension_user_is_reused() {
        let registry = Arc::new(AuthRegistry::in_memory(ProviderRegistry::default()).unwrap());
        let mut parts = parts(Method::GET, None);
        parts
            .extensions
            .insert(AuthUser::from(User::new("u9", "ext@example.com")));

        let user = <AuthUser as FromRequestParts<_>>::from_request_parts(&mut parts, &registry)
            .await
            .ok()
            .unwrap();
        assert_eq!(user.id, "u9");
    }
}
