use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use http::HeaderMap;

use authlink::{
    AuthRegistry, AuthResponse, FlashMessage, LinkAction, ProviderError, resolve_provider_callback,
};

use super::{PageResult, flash_redirect, parse_provider, reject};
use crate::error::IntoResponseError;
use crate::redirect::found;

/// Send the browser to the provider's authorization page.
pub(crate) async fn auth_start(
    State(registry): State<Arc<AuthRegistry>>,
    Path(provider): Path<String>,
) -> PageResult {
    let kind = parse_provider(&provider)?;
    let config = registry.providers().get(kind).into_response_error()?;
    let (auth_url, cookie) = registry
        .oauth2()
        .prepare_auth_request(config)
        .await
        .into_response_error()?;
    Ok((cookie, found(&auth_url)).into_response())
}

/// Finish the handshake, then sign in, create or link depending on who is asking.
pub(crate) async fn auth_callback(
    State(registry): State<Arc<AuthRegistry>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AuthResponse>,
) -> PageResult {
    let kind = parse_provider(&provider)?;
    let config = registry.providers().get(kind).into_response_error()?;

    let current = registry
        .sessions()
        .current_user(&headers, registry.users())
        .await
        .into_response_error()?;
    let fallback = if current.is_some() { "/account" } else { "/login" };

    let callback = match registry.oauth2().complete_auth(config, &query, &headers).await {
        Ok(callback) => callback,
        Err(ProviderError::Denied(reason)) => {
            tracing::debug!(provider = %kind, "Authorization denied: {}", reason);
            let message = FlashMessage::errors(format!(
                "{} sign-in was cancelled.",
                kind.display_name()
            ));
            return flash_redirect(&registry, &headers, message, fallback).await;
        }
        Err(e) => {
            tracing::error!(provider = %kind, "Provider handshake failed: {}", e);
            return Err::<_, ProviderError>(e).into_response_error();
        }
    };

    let outcome = match resolve_provider_callback(registry.users(), current.as_ref(), callback).await
    {
        Ok(outcome) => outcome,
        Err(e) => return reject(&registry, &headers, e, fallback).await,
    };

    match outcome.action {
        LinkAction::Linked | LinkAction::AlreadyLinked => {
            let to = registry
                .sessions()
                .take_return_to(&headers)
                .await
                .into_response_error()?
                .unwrap_or_else(|| "/account".to_string());
            match outcome.flash() {
                Some(message) => flash_redirect(&registry, &headers, message, &to).await,
                None => Ok(found(&to)),
            }
        }
        LinkAction::SignedIn | LinkAction::Created => {
            let login = registry
                .sessions()
                .login_with_flash(&headers, &outcome.user.id, outcome.flash().into_iter().collect())
                .await
                .into_response_error()?;
            let to = login.return_to.unwrap_or_else(|| "/".to_string());
            tracing::debug!(user_id = %outcome.user.id, action = ?outcome.action, "Provider sign-in");
            Ok((login.headers, found(&to)).into_response())
        }
    }
}
