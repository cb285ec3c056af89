use crate::provider::{ProviderCallback, ProviderCredentials, ProviderProfile};
use crate::session::FlashMessage;
use crate::userdb::{AccessToken, ProviderKind, User, UserError, UserSearchField, UserStore};

use super::account::gen_new_user_id;
use super::errors::CoordinationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Provider identity added to the signed-in account.
    Linked,
    /// Signed-in account already owned the identity; its token was refreshed.
    AlreadyLinked,
    /// Anonymous caller signed in to the account owning the identity.
    SignedIn,
    /// Anonymous caller with an unknown identity got a new account.
    Created,
}

#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub user: User,
    pub provider: ProviderKind,
    pub action: LinkAction,
}

impl LinkOutcome {
    pub fn flash(&self) -> Option<FlashMessage> {
        match self.action {
            LinkAction::Linked => Some(FlashMessage::info(format!(
                "{} account has been linked.",
                self.provider.display_name()
            ))),
            _ => None,
        }
    }
}

/// Decide what a completed provider handshake means for the caller.
///
/// | caller        | identity owner | result                                 |
/// |---------------|----------------|----------------------------------------|
/// | signed in     | someone else   | `ProviderAlreadyLinked`, nothing saved |
/// | signed in     | the caller     | token refreshed, `AlreadyLinked`       |
/// | signed in     | nobody         | identity linked, `Linked`              |
/// | anonymous     | someone        | `SignedIn` as the owner, nothing saved |
/// | anonymous     | nobody         | new account, `Created`                 |
///
/// The provider's email is never used to find an account.
#[tracing::instrument(
    skip(users, current, callback),
    fields(provider = %callback.profile.provider, provider_user_id = %callback.profile.id)
)]
pub async fn resolve_provider_callback(
    users: &dyn UserStore,
    current: Option<&User>,
    callback: ProviderCallback,
) -> Result<LinkOutcome, CoordinationError> {
    let ProviderCallback {
        profile,
        credentials,
    } = callback;
    let provider = profile.provider;

    let owner = users
        .find_one(&UserSearchField::Provider(provider, profile.id.clone()))
        .await?;

    let (user, action) = match (current, owner) {
        (Some(current), Some(owner)) if owner.id != current.id => {
            return Err(CoordinationError::ProviderAlreadyLinked(provider).log());
        }
        (Some(_), Some(mut owner)) => {
            refresh_token(&mut owner, provider, credentials);
            (users.save(owner).await?, LinkAction::AlreadyLinked)
        }
        (Some(current), None) => {
            let mut user = users
                .find_by_id(&current.id)
                .await?
                .ok_or_else(|| CoordinationError::Unauthorized.log())?;
            apply_link(&mut user, &profile, credentials);
            match users.save(user).await {
                Ok(user) => (user, LinkAction::Linked),
                Err(UserError::Conflict(_)) => {
                    return Err(CoordinationError::ProviderAlreadyLinked(provider).log());
                }
                Err(e) => return Err(e.into()),
            }
        }
        (None, Some(owner)) => (owner, LinkAction::SignedIn),
        (None, None) => create_user(users, &profile, credentials).await?,
    };

    tracing::debug!(user_id = %user.id, action = ?action, "Provider callback resolved");
    Ok(LinkOutcome {
        user,
        provider,
        action,
    })
}

async fn create_user(
    users: &dyn UserStore,
    profile: &ProviderProfile,
    credentials: ProviderCredentials,
) -> Result<(User, LinkAction), CoordinationError> {
    let email = synthesized_email(profile);
    let mut user = User::new(gen_new_user_id(users).await?, &email);
    apply_link(&mut user, profile, credentials);

    match users.save(user).await {
        Ok(user) => Ok((user, LinkAction::Created)),
        Err(UserError::Conflict(msg)) => {
            // Another request may have created the owner since the lookup.
            let field = UserSearchField::Provider(profile.provider, profile.id.clone());
            match users.find_one(&field).await? {
                Some(owner) => Ok((owner, LinkAction::SignedIn)),
                None => {
                    tracing::debug!("Synthesized email collides: {}", msg);
                    Err(CoordinationError::EmailTaken(email).log())
                }
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// `<handle or id>@<provider>.com`, lower-cased.
pub(super) fn synthesized_email(profile: &ProviderProfile) -> String {
    let local = profile.handle.as_deref().unwrap_or(&profile.id);
    format!("{local}@{}.com", profile.provider).to_lowercase()
}

fn apply_link(user: &mut User, profile: &ProviderProfile, credentials: ProviderCredentials) {
    user.providers.set(profile.provider, Some(profile.id.clone()));
    user.tokens.push(AccessToken {
        kind: profile.provider,
        access_token: credentials.access_token,
        token_secret: credentials.token_secret,
    });

    backfill(&mut user.profile.name, Some(&profile.display_name));
    backfill(&mut user.profile.location, profile.location.as_deref());
    backfill(&mut user.profile.picture, profile.avatar_url.as_deref());
}

fn refresh_token(user: &mut User, kind: ProviderKind, credentials: ProviderCredentials) {
    match user.tokens.iter_mut().find(|token| token.kind == kind) {
        Some(token) => {
            token.access_token = credentials.access_token;
            token.token_secret = credentials.token_secret;
        }
        None => user.tokens.push(AccessToken {
            kind,
            access_token: credentials.access_token,
            token_secret: credentials.token_secret,
        }),
    }
}

/// Only empty profile fields take the provider's value.
fn backfill(field: &mut String, value: Option<&str>) {
    if field.is_empty() {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *field = value.to_string();
        }
    }
}
