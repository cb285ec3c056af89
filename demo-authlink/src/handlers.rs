use std::str::FromStr;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};

use authlink_axum::{AuthRegistry, AuthUser, Flash, ProviderKind};

#[derive(Template)]
#[template(path = "index.j2", escape = "html")]
struct IndexTemplate<'a> {
    title: &'a str,
    signed_in: bool,
    flash: Flash,
    email: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "api.j2", escape = "html")]
struct ApiTemplate<'a> {
    title: &'a str,
    signed_in: bool,
    flash: Flash,
    provider: &'a str,
    provider_user_id: &'a str,
    token_prefix: String,
}

fn render(template: &impl Template) -> Result<Html<String>, (StatusCode, String)> {
    let html = template
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Html(html))
}

async fn take_flash(registry: &AuthRegistry, headers: &HeaderMap) -> Flash {
    match registry.sessions().take_flash(headers).await {
        Ok(messages) => Flash::from(messages),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {}", e);
            Flash::default()
        }
    }
}

pub(crate) async fn index(
    State(registry): State<Arc<AuthRegistry>>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> Result<Html<String>, (StatusCode, String)> {
    let template = IndexTemplate {
        title: "Home",
        signed_in: user.is_some(),
        flash: take_flash(&registry, &headers).await,
        email: user.as_ref().map(|u| u.email.as_str()),
    };
    render(&template)
}

/// Provider api page, reached only with a token for that provider.
pub(crate) async fn api(
    State(registry): State<Arc<AuthRegistry>>,
    user: AuthUser,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Result<Html<String>, (StatusCode, String)> {
    let kind = ProviderKind::from_str(&provider)
        .map_err(|_| (StatusCode::NOT_FOUND, format!("Unknown provider: {provider}")))?;
    let token = user
        .token(kind)
        .ok_or((StatusCode::FORBIDDEN, "Missing provider token".to_string()))?;

    tracing::trace!(user_id = %user.id, provider = %kind, "Serving api page");
    let template = ApiTemplate {
        title: kind.display_name(),
        signed_in: true,
        flash: take_flash(&registry, &headers).await,
        provider: kind.display_name(),
        provider_user_id: user.providers.get(kind).unwrap_or_default(),
        token_prefix: token.access_token.chars().take(4).collect(),
    };
    render(&template)
}
