use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use authlink::{AuthRegistry, provider_from_path};

use super::redirect::found;
use super::session::AuthUser;

/// Remember where the request was going, then send it to `location`.
async fn redirect_remembering(
    registry: &AuthRegistry,
    headers: &HeaderMap,
    path: &str,
    location: &str,
) -> Response {
    let headers = registry
        .sessions()
        .remember_return_to(headers, path)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to remember return path: {}", e);
            HeaderMap::new()
        });
    (headers, found(location)).into_response()
}

/// Require a signed-in user; the user is put in the request extensions as [`AuthUser`].
///
/// Anonymous requests are redirected to the login page.
pub async fn is_authenticated(
    State(registry): State<Arc<AuthRegistry>>,
    mut req: Request,
    next: Next,
) -> Response {
    let headers = req.headers().clone();
    let current = registry
        .sessions()
        .current_user(&headers, registry.users())
        .await;
    match current {
        Ok(Some(user)) => {
            tracing::trace!(user_id = %user.id, "Authenticated request");
            req.extensions_mut().insert(AuthUser::from(user));
            next.run(req).await
        }
        Ok(None) => {
            let path = req.uri().path().to_string();
            let login_url = registry.config().login_url.clone();
            redirect_remembering(&registry, &headers, &path, &login_url).await
        }
        Err(e) => {
            tracing::error!("Failed to resolve session user: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Require an access token for the provider named by the last path segment.
///
/// Must be layered inside [`is_authenticated`]. Users without the token are
/// sent to `/auth/<provider>` to link it.
pub async fn is_authorized(
    State(registry): State<Arc<AuthRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(user) = req.extensions().get::<AuthUser>() else {
        tracing::error!("is_authorized ran without an authenticated user");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    let provider = provider_from_path(req.uri().path()).to_string();
    if authlink::is_authorized(user, &provider) {
        return next.run(req).await;
    }

    tracing::debug!(user_id = %user.id, provider = %provider, "Missing provider token");
    let headers = req.headers().clone();
    let path = req.uri().path().to_string();
    redirect_remembering(&registry, &headers, &path, &format!("/auth/{provider}")).await
}
