use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    response::IntoResponse,
};
use http::HeaderMap;
use serde::Deserialize;

use authlink::{AuthRegistry, CoordinationError, Flash, FlashMessage, verify_credentials};

use super::{PageResult, ProviderLink, provider_links, reject, render, take_flash};
use crate::error::IntoResponseError;
use crate::redirect::found;
use crate::session::AuthUser;

#[derive(Template)]
#[template(path = "login.j2", escape = "html")]
struct LoginTemplate {
    title: &'static str,
    signed_in: bool,
    flash: Flash,
    providers: Vec<ProviderLink>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub(crate) async fn login_page(
    State(registry): State<Arc<AuthRegistry>>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> PageResult {
    if user.is_some() {
        return Ok(found("/"));
    }

    let template = LoginTemplate {
        title: "Login",
        signed_in: false,
        flash: take_flash(&registry, &headers).await?,
        providers: provider_links(&registry, |_| false),
    };
    render(&template)
}

pub(crate) async fn login(
    State(registry): State<Arc<AuthRegistry>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> PageResult {
    if form.password.is_empty() {
        let err = CoordinationError::Validation("Password cannot be blank.".to_string());
        return reject(&registry, &headers, err, "/login").await;
    }

    let user = match verify_credentials(registry.users(), &form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => return reject(&registry, &headers, e, "/login").await,
    };

    let login = registry
        .sessions()
        .login_with_flash(
            &headers,
            &user.id,
            vec![FlashMessage::success("Success! You are logged in.")],
        )
        .await
        .into_response_error()?;

    let to = login.return_to.unwrap_or_else(|| "/".to_string());
    tracing::debug!(user_id = %user.id, "Signed in with password, redirecting to {}", to);
    Ok((login.headers, found(&to)).into_response())
}

pub(crate) async fn logout(
    State(registry): State<Arc<AuthRegistry>>,
    headers: HeaderMap,
) -> PageResult {
    let cookie = registry
        .sessions()
        .logout(&headers)
        .await
        .into_response_error()?;
    Ok((cookie, found("/")).into_response())
}
