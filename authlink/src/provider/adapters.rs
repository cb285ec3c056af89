//! Per-provider normalization of userinfo payloads into [`ProviderProfile`].

use serde_json::Value;

use crate::userdb::ProviderKind;

use super::errors::ProviderError;
use super::types::ProviderProfile;

pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError>;
}

/// Non-empty string at `pointer`.
fn text(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ids arrive as strings from most providers and as numbers from GitHub.
fn identifier(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require_id(kind: ProviderKind, id: Option<String>) -> Result<String, ProviderError> {
    id.ok_or_else(|| ProviderError::InvalidProfile(format!("{kind} payload has no user id")))
}

fn profile(
    provider: ProviderKind,
    id: String,
    handle: Option<String>,
    name: Option<String>,
    location: Option<String>,
    avatar_url: Option<String>,
) -> ProviderProfile {
    let display_name = name
        .or_else(|| handle.clone())
        .unwrap_or_else(|| id.clone());
    ProviderProfile {
        provider,
        id,
        handle,
        display_name,
        location,
        avatar_url,
    }
}

pub struct TwitterAdapter;
pub struct GitHubAdapter;
pub struct GoogleAdapter;
pub struct FacebookAdapter;
pub struct InstagramAdapter;
pub struct LinkedInAdapter;

impl ProviderAdapter for TwitterAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Twitter
    }

    // v2 wraps the user in `data`; v1.1 returns it flat with `id_str`/`screen_name`.
    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        let user = raw.get("data").unwrap_or(raw);
        let id = identifier(user, "/id_str").or_else(|| identifier(user, "/id"));
        Ok(profile(
            self.kind(),
            require_id(self.kind(), id)?,
            text(user, "/username").or_else(|| text(user, "/screen_name")),
            text(user, "/name"),
            text(user, "/location"),
            text(user, "/profile_image_url_https").or_else(|| text(user, "/profile_image_url")),
        ))
    }
}

impl ProviderAdapter for GitHubAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        Ok(profile(
            self.kind(),
            require_id(self.kind(), identifier(raw, "/id"))?,
            text(raw, "/login"),
            text(raw, "/name"),
            text(raw, "/location"),
            text(raw, "/avatar_url"),
        ))
    }
}

impl ProviderAdapter for GoogleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        let id = identifier(raw, "/sub").or_else(|| identifier(raw, "/id"));
        Ok(profile(
            self.kind(),
            require_id(self.kind(), id)?,
            None,
            text(raw, "/name"),
            None,
            text(raw, "/picture"),
        ))
    }
}

impl ProviderAdapter for FacebookAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Facebook
    }

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        let id = require_id(self.kind(), identifier(raw, "/id"))?;
        let avatar = text(raw, "/picture/data/url")
            .unwrap_or_else(|| format!("https://graph.facebook.com/{id}/picture?type=large"));
        Ok(profile(
            self.kind(),
            id,
            None,
            text(raw, "/name"),
            text(raw, "/location/name"),
            Some(avatar),
        ))
    }
}

impl ProviderAdapter for InstagramAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Instagram
    }

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        let user = raw.get("data").unwrap_or(raw);
        Ok(profile(
            self.kind(),
            require_id(self.kind(), identifier(user, "/id"))?,
            text(user, "/username"),
            text(user, "/full_name").or_else(|| text(user, "/name")),
            None,
            text(user, "/profile_picture"),
        ))
    }
}

impl ProviderAdapter for LinkedInAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LinkedIn
    }

    fn normalize(&self, raw: &Value) -> Result<ProviderProfile, ProviderError> {
        let id = identifier(raw, "/sub").or_else(|| identifier(raw, "/id"));
        let name = text(raw, "/name").or_else(|| {
            match (
                text(raw, "/localizedFirstName"),
                text(raw, "/localizedLastName"),
            ) {
                (Some(first), Some(last)) => Some(format!("{first} {last}")),
                (first, last) => first.or(last),
            }
        });
        Ok(profile(
            self.kind(),
            require_id(self.kind(), id)?,
            None,
            name,
            text(raw, "/locale/country").or_else(|| text(raw, "/location/name")),
            text(raw, "/picture"),
        ))
    }
}

pub fn adapter_for(kind: ProviderKind) -> &'static dyn ProviderAdapter {
    match kind {
        ProviderKind::Twitter => &TwitterAdapter,
        ProviderKind::GitHub => &GitHubAdapter,
        ProviderKind::Google => &GoogleAdapter,
        ProviderKind::Facebook => &FacebookAdapter,
        ProviderKind::Instagram => &InstagramAdapter,
        ProviderKind::LinkedIn => &LinkedInAdapter,
    }
}
