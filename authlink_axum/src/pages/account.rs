use std::sync::Arc;

use askama::Template;
use axum::extract::{Form, Path, State};
use http::HeaderMap;
use serde::Deserialize;

use authlink::{AuthRegistry, Flash, ProfileUpdate, User};

use super::{
    PageResult, ProviderLink, flash_redirect, parse_provider, provider_links, reject, render,
    take_flash,
};
use crate::session::AuthUser;

#[derive(Template)]
#[template(path = "account.j2", escape = "html")]
struct AccountTemplate {
    title: &'static str,
    signed_in: bool,
    flash: Flash,
    user: User,
    providers: Vec<ProviderLink>,
}

#[derive(Deserialize)]
pub(crate) struct ProfileForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    website: String,
}

#[derive(Deserialize)]
pub(crate) struct PasswordForm {
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

pub(crate) async fn account_page(
    State(registry): State<Arc<AuthRegistry>>,
    AuthUser { user }: AuthUser,
    headers: HeaderMap,
) -> PageResult {
    let flash = take_flash(&registry, &headers).await?;
    let providers = provider_links(&registry, |kind| user.providers.get(kind).is_some());
    let template = AccountTemplate {
        title: "Account Management",
        signed_in: true,
        flash,
        user,
        providers,
    };
    render(&template)
}

pub(crate) async fn update_profile(
    State(registry): State<Arc<AuthRegistry>>,
    user: AuthUser,
    headers: HeaderMap,
    Form(form): Form<ProfileForm>,
) -> PageResult {
    let update = ProfileUpdate {
        email: form.email,
        name: form.name,
        gender: form.gender,
        location: form.location,
        website: form.website,
    };
    match authlink::update_profile(registry.users(), &user.id, update).await {
        Ok((_, message)) => flash_redirect(&registry, &headers, message, "/account").await,
        Err(e) => reject(&registry, &headers, e, "/account").await,
    }
}

pub(crate) async fn change_password(
    State(registry): State<Arc<AuthRegistry>>,
    user: AuthUser,
    headers: HeaderMap,
    Form(form): Form<PasswordForm>,
) -> PageResult {
    match authlink::change_password(
        registry.users(),
        &user.id,
        &form.password,
        &form.confirm_password,
    )
    .await
    {
        Ok((_, message)) => flash_redirect(&registry, &headers, message, "/account").await,
        Err(e) => reject(&registry, &headers, e, "/account").await,
    }
}

pub(crate) async fn unlink(
    State(registry): State<Arc<AuthRegistry>>,
    user: AuthUser,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> PageResult {
    let kind = parse_provider(&provider)?;
    match authlink::unlink_provider(registry.users(), &user.id, kind).await {
        Ok((_, message)) => flash_redirect(&registry, &headers, message, "/account").await,
        Err(e) => reject(&registry, &headers, e, "/account").await,
    }
}
