use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, State},
    response::IntoResponse,
};
use http::HeaderMap;
use serde::Deserialize;

use authlink::{AuthRegistry, Flash, register_local_user};

use super::{PageResult, reject, render, take_flash};
use crate::error::IntoResponseError;
use crate::redirect::found;
use crate::session::AuthUser;

#[derive(Template)]
#[template(path = "signup.j2", escape = "html")]
struct SignupTemplate {
    title: &'static str,
    signed_in: bool,
    flash: Flash,
}

#[derive(Deserialize)]
pub(crate) struct SignupForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

pub(crate) async fn signup_page(
    State(registry): State<Arc<AuthRegistry>>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> PageResult {
    if user.is_some() {
        return Ok(found("/"));
    }

    let template = SignupTemplate {
        title: "Create Account",
        signed_in: false,
        flash: take_flash(&registry, &headers).await?,
    };
    render(&template)
}

pub(crate) async fn signup(
    State(registry): State<Arc<AuthRegistry>>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> PageResult {
    let user = match register_local_user(
        registry.users(),
        &form.email,
        &form.password,
        &form.confirm_password,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => return reject(&registry, &headers, e, "/signup").await,
    };

    let login = registry
        .sessions()
        .login(&headers, &user.id)
        .await
        .into_response_error()?;
    let to = login.return_to.unwrap_or_else(|| "/".to_string());
    Ok((login.headers, found(&to)).into_response())
}
