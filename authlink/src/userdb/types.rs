use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::UserError;

/// External identity providers a user can sign in with or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Twitter,
    GitHub,
    Google,
    Facebook,
    Instagram,
    LinkedIn,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Twitter,
        ProviderKind::GitHub,
        ProviderKind::Google,
        ProviderKind::Facebook,
        ProviderKind::Instagram,
        ProviderKind::LinkedIn,
    ];

    /// Lowercase tag used in paths, token kinds and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::GitHub => "github",
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::LinkedIn => "linkedin",
        }
    }

    /// Human readable name used in flash messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::GitHub => "GitHub",
            Self::Google => "Google",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::LinkedIn => "LinkedIn",
        }
    }

    /// Prefix of the environment variables configuring this provider.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Twitter => "TWITTER",
            Self::GitHub => "GITHUB",
            Self::Google => "GOOGLE",
            Self::Facebook => "FACEBOOK",
            Self::Instagram => "INSTAGRAM",
            Self::LinkedIn => "LINKEDIN",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UserError::InvalidData(format!("Unknown provider: {s}")))
    }
}

/// Provider user ids linked to an account, one slot per provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIds {
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub google: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

impl ProviderIds {
    fn slot(&self, kind: ProviderKind) -> &Option<String> {
        match kind {
            ProviderKind::Twitter => &self.twitter,
            ProviderKind::GitHub => &self.github,
            ProviderKind::Google => &self.google,
            ProviderKind::Facebook => &self.facebook,
            ProviderKind::Instagram => &self.instagram,
            ProviderKind::LinkedIn => &self.linkedin,
        }
    }

    fn slot_mut(&mut self, kind: ProviderKind) -> &mut Option<String> {
        match kind {
            ProviderKind::Twitter => &mut self.twitter,
            ProviderKind::GitHub => &mut self.github,
            ProviderKind::Google => &mut self.google,
            ProviderKind::Facebook => &mut self.facebook,
            ProviderKind::Instagram => &mut self.instagram,
            ProviderKind::LinkedIn => &mut self.linkedin,
        }
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn set(&mut self, kind: ProviderKind, id: Option<String>) {
        *self.slot_mut(kind) = id;
    }

    /// Linked providers with their ids, in `ProviderKind::ALL` order.
    pub fn linked(&self) -> impl Iterator<Item = (ProviderKind, &str)> + '_ {
        ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|id| (kind, id)))
    }
}

/// Editable profile. An empty string means the field is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub gender: String,
    pub location: String,
    pub website: String,
    pub picture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub kind: ProviderKind,
    pub access_token: String,
    pub token_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string; absent for accounts created through a provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub providers: ProviderIds,
    pub profile: Profile,
    pub tokens: Vec<AccessToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.trim().to_lowercase(),
            password: None,
            providers: ProviderIds::default(),
            profile: Profile::default(),
            tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn token(&self, kind: ProviderKind) -> Option<&AccessToken> {
        self.tokens.iter().find(|token| token.kind == kind)
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// Lookup keys accepted by `UserStore::find_one`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSearchField {
    Id(String),
    /// Matched case-insensitively.
    Email(String),
    Provider(ProviderKind, String),
}

impl fmt::Display for UserSearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "Id({id})"),
            Self::Email(email) => write!(f, "Email({email})"),
            Self::Provider(kind, id) => write!(f, "Provider({kind}, {id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_provider_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderKind::GitHub).unwrap();
        assert_eq!(json, "\"github\"");
        let kind: ProviderKind = serde_json::from_str("\"linkedin\"").unwrap();
        assert_eq!(kind, ProviderKind::LinkedIn);
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("twitter".parse::<ProviderKind>().unwrap(), ProviderKind::Twitter);
        assert_eq!("GitHub".parse::<ProviderKind>().unwrap(), ProviderKind::GitHub);
        assert!("myspace".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_ids_set_and_linked() {
        // Given provider ids with two providers linked
        let mut ids = ProviderIds::default();
        ids.set(ProviderKind::Google, Some("g-1".to_string()));
        ids.set(ProviderKind::Twitter, Some("t-1".to_string()));

        // Then linked lists them in declaration order
        let linked: Vec<_> = ids.linked().collect();
        assert_eq!(
            linked,
            vec![(ProviderKind::Twitter, "t-1"), (ProviderKind::Google, "g-1")]
        );

        // And clearing a slot unlinks it
        ids.set(ProviderKind::Twitter, None);
        assert_eq!(ids.get(ProviderKind::Twitter), None);
    }

    #[test]
    fn test_user_new_normalizes_email() {
        let user = User::new("u1", "  Alice@Example.COM ");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.tokens.is_empty());
        assert!(!user.has_password());
    }

    #[test]
    fn test_profile_defaults_when_fields_missing() {
        let profile: Profile = serde_json::from_str(r#"{"name":"Bob"}"#).unwrap();
        assert_eq!(profile.name, "Bob");
        assert_eq!(profile.picture, "");
    }

    #[test]
    fn test_user_token_lookup() {
        let mut user = User::new("u1", "a@b.c");
        user.tokens.push(AccessToken {
            kind: ProviderKind::GitHub,
            access_token: "gh".to_string(),
            token_secret: None,
        });
        assert!(user.token(ProviderKind::GitHub).is_some());
        assert!(user.token(ProviderKind::Twitter).is_none());
    }

    proptest! {
        #[test]
        fn prop_user_email_is_lowercase(email in "[A-Za-z0-9]{1,12}@[A-Za-z]{1,8}\\.[A-Za-z]{2,3}") {
            let user = User::new("id", &email);
            prop_assert_eq!(user.email.clone(), user.email.to_lowercase());
            prop_assert_eq!(user.email, email.to_lowercase());
        }
    }
}
