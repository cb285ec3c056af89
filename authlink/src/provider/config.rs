use std::collections::HashMap;

use crate::userdb::ProviderKind;

use super::errors::ProviderError;

/// How the client authenticates at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAuthMethod {
    /// `client_id`/`client_secret` in the form body.
    ClientSecretPost,
    /// HTTP basic authentication.
    ClientSecretBasic,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scope: String,
    pub redirect_uri: String,
    pub token_auth: TokenAuthMethod,
}

struct ProviderDefaults {
    auth_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scope: &'static str,
    token_auth: TokenAuthMethod,
}

fn defaults(kind: ProviderKind) -> ProviderDefaults {
    use TokenAuthMethod::*;
    match kind {
        ProviderKind::Twitter => ProviderDefaults {
            auth_url: "https://twitter.com/i/oauth2/authorize",
            token_url: "https://api.twitter.com/2/oauth2/token",
            userinfo_url: "https://api.twitter.com/2/users/me?user.fields=profile_image_url,location",
            scope: "tweet.read users.read offline.access",
            token_auth: ClientSecretBasic,
        },
        ProviderKind::GitHub => ProviderDefaults {
            auth_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            userinfo_url: "https://api.github.com/user",
            scope: "read:user user:email",
            token_auth: ClientSecretPost,
        },
        ProviderKind::Google => ProviderDefaults {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
            scope: "openid email profile",
            token_auth: ClientSecretPost,
        },
        ProviderKind::Facebook => ProviderDefaults {
            auth_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            userinfo_url: "https://graph.facebook.com/me?fields=id,name,picture,location",
            scope: "email public_profile",
            token_auth: ClientSecretPost,
        },
        ProviderKind::Instagram => ProviderDefaults {
            auth_url: "https://api.instagram.com/oauth/authorize",
            token_url: "https://api.instagram.com/oauth/access_token",
            userinfo_url: "https://graph.instagram.com/me?fields=id,username",
            scope: "user_profile",
            token_auth: ClientSecretPost,
        },
        ProviderKind::LinkedIn => ProviderDefaults {
            auth_url: "https://www.linkedin.com/oauth/v2/authorization",
            token_url: "https://www.linkedin.com/oauth/v2/accessToken",
            userinfo_url: "https://api.linkedin.com/v2/userinfo",
            scope: "openid profile email",
            token_auth: ClientSecretPost,
        },
    }
}

impl ProviderConfig {
    /// Build a config from `<PROVIDER>_*` variables. `None` unless both key and secret are set.
    pub fn from_lookup(
        kind: ProviderKind,
        origin: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let prefix = kind.env_prefix();
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());

        let client_id = var("KEY")?;
        let client_secret = var("SECRET")?;
        let d = defaults(kind);

        Some(Self {
            kind,
            client_id,
            client_secret,
            auth_url: var("AUTH_URL").unwrap_or_else(|| d.auth_url.to_string()),
            token_url: var("TOKEN_URL").unwrap_or_else(|| d.token_url.to_string()),
            userinfo_url: var("USERINFO_URL").unwrap_or_else(|| d.userinfo_url.to_string()),
            scope: var("SCOPE").unwrap_or_else(|| d.scope.to_string()),
            redirect_uri: format!("{}/auth/{}/callback", origin.trim_end_matches('/'), kind),
            token_auth: d.token_auth,
        })
    }
}

/// Enabled providers, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn from_lookup(origin: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut registry = Self::default();
        for kind in ProviderKind::ALL {
            match ProviderConfig::from_lookup(kind, origin, &lookup) {
                Some(config) => {
                    tracing::info!(provider = %kind, "Provider enabled");
                    registry = registry.with(config);
                }
                None => tracing::debug!(provider = %kind, "Provider disabled: no key/secret"),
            }
        }
        registry
    }

    pub fn with(mut self, config: ProviderConfig) -> Self {
        self.providers.insert(config.kind, config);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Result<&ProviderConfig, ProviderError> {
        self.providers.get(&kind).ok_or(ProviderError::NotConfigured(kind))
    }

    pub fn enabled(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_provider_disabled_without_secret() {
        let lookup = lookup_from(&[("GITHUB_KEY", "id")]);
        assert!(ProviderConfig::from_lookup(ProviderKind::GitHub, "http://x", lookup).is_none());
    }

    #[test]
    fn test_provider_defaults_and_callback() {
        // Given key and secret only
        let lookup = lookup_from(&[("GITHUB_KEY", "id"), ("GITHUB_SECRET", "secret")]);

        // When building the config
        let config =
            ProviderConfig::from_lookup(ProviderKind::GitHub, "http://localhost:3000/", lookup)
                .unwrap();

        // Then endpoints default and the callback is derived from the origin
        assert_eq!(config.auth_url, "https://github.com/login/oauth/authorize");
        assert_eq!(config.userinfo_url, "https://api.github.com/user");
        assert_eq!(
            config.redirect_uri,
            "http://localhost:3000/auth/github/callback"
        );
        assert_eq!(config.token_auth, TokenAuthMethod::ClientSecretPost);
    }

    #[test]
    fn test_provider_endpoint_overrides() {
        let lookup = lookup_from(&[
            ("TWITTER_KEY", "id"),
            ("TWITTER_SECRET", "secret"),
            ("TWITTER_TOKEN_URL", "http://127.0.0.1:9999/token"),
        ]);
        let config =
            ProviderConfig::from_lookup(ProviderKind::Twitter, "https://app.example", lookup)
                .unwrap();
        assert_eq!(config.token_url, "http://127.0.0.1:9999/token");
        assert_eq!(config.token_auth, TokenAuthMethod::ClientSecretBasic);
    }

    #[test]
    fn test_registry_enabled_and_get() {
        let lookup = lookup_from(&[
            ("GOOGLE_KEY", "g"),
            ("GOOGLE_SECRET", "gs"),
            ("TWITTER_KEY", "t"),
            ("TWITTER_SECRET", "ts"),
        ]);
        let registry = ProviderRegistry::from_lookup("http://localhost:3000", lookup);

        assert_eq!(
            registry.enabled(),
            vec![ProviderKind::Twitter, ProviderKind::Google]
        );
        assert!(registry.get(ProviderKind::Google).is_ok());
        assert!(matches!(
            registry.get(ProviderKind::GitHub),
            Err(ProviderError::NotConfigured(ProviderKind::GitHub))
        ));
    }
}
