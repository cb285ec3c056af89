//! HTML pages and form handlers for local accounts and provider sign-in.

mod account;
mod login;
mod provider;
mod signup;

pub(crate) use account::{account_page, change_password, unlink, update_profile};
pub(crate) use login::{login, login_page, logout};
pub(crate) use provider::{auth_callback, auth_start};
pub(crate) use signup::{signup, signup_page};

use std::str::FromStr;

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use http::{HeaderMap, StatusCode};

use authlink::{AuthRegistry, CoordinationError, Flash, FlashMessage, ProviderKind};

use crate::error::{IntoResponseError, status_of};
use crate::redirect::found;

pub(crate) type PageResult = Result<Response, (StatusCode, String)>;

/// Sign-in or link button for one enabled provider.
pub(crate) struct ProviderLink {
    pub(crate) kind: &'static str,
    pub(crate) name: &'static str,
    pub(crate) linked: bool,
}

fn provider_links(
    registry: &AuthRegistry,
    linked: impl Fn(ProviderKind) -> bool,
) -> Vec<ProviderLink> {
    registry
        .providers()
        .enabled()
        .into_iter()
        .map(|kind| ProviderLink {
            kind: kind.as_str(),
            name: kind.display_name(),
            linked: linked(kind),
        })
        .collect()
}

fn render(template: &impl Template) -> PageResult {
    let html = template
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Html(html).into_response())
}

fn parse_provider(provider: &str) -> Result<ProviderKind, (StatusCode, String)> {
    ProviderKind::from_str(provider)
        .map_err(|_| (StatusCode::NOT_FOUND, format!("Unknown provider: {provider}")))
}

async fn take_flash(
    registry: &AuthRegistry,
    headers: &HeaderMap,
) -> Result<Flash, (StatusCode, String)> {
    let messages = registry
        .sessions()
        .take_flash(headers)
        .await
        .into_response_error()?;
    Ok(Flash::from(messages))
}

async fn flash_redirect(
    registry: &AuthRegistry,
    headers: &HeaderMap,
    message: FlashMessage,
    to: &str,
) -> PageResult {
    let cookie = registry
        .sessions()
        .push_flash(headers, message)
        .await
        .into_response_error()?;
    Ok((cookie, found(to)).into_response())
}

/// Expected outcomes go back to `to` with a flash message; faults become an error status.
async fn reject(
    registry: &AuthRegistry,
    headers: &HeaderMap,
    err: CoordinationError,
    to: &str,
) -> PageResult {
    match err.flash() {
        Some(message) => flash_redirect(registry, headers, message, to).await,
        None => Err((status_of(&err), err.to_string())),
    }
}
