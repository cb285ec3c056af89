use chrono::{Duration, Utc};
use http::header::HeaderMap;
use sha2::{Digest, Sha256};
use std::time::Duration as StdDuration;
use subtle::ConstantTimeEq;
use url::Url;

use crate::storage::{CacheData, SharedCacheStore};
use crate::utils::{base64url_encode, gen_random_string, get_cookie_value, header_set_cookie};

use super::adapters::adapter_for;
use super::config::{ProviderConfig, TokenAuthMethod};
use super::errors::ProviderError;
use super::types::{
    AuthResponse, ProviderCallback, ProviderCredentials, StoredState, TokenResponse,
};

const STATE_PREFIX: &str = "oauth2_state";
const USER_AGENT: &str = concat!("authlink/", env!("CARGO_PKG_VERSION"));

/// Authorization-code + PKCE client shared by every provider.
pub struct OAuth2Client {
    cache: SharedCacheStore,
    csrf_cookie_name: String,
    csrf_cookie_max_age: u64,
    http: reqwest::Client,
}

/// Creates the HTTP client used for token exchange and userinfo requests.
///
/// Requests time out after 30 seconds so a stalled provider cannot hold a
/// request task indefinitely.
fn get_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(StdDuration::from_secs(30))
        .pool_idle_timeout(StdDuration::from_secs(90))
        .pool_max_idle_per_host(32)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::HttpClient(e.to_string()))
}

impl OAuth2Client {
    pub fn new(
        cache: SharedCacheStore,
        csrf_cookie_name: impl Into<String>,
        csrf_cookie_max_age: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            cache,
            csrf_cookie_name: csrf_cookie_name.into(),
            csrf_cookie_max_age,
            http: get_client()?,
        })
    }

    /// Build the provider authorization URL and the CSRF cookie for the browser.
    #[tracing::instrument(skip(self, config), fields(provider = %config.kind))]
    pub async fn prepare_auth_request(
        &self,
        config: &ProviderConfig,
    ) -> Result<(String, HeaderMap), ProviderError> {
        let ttl = self.csrf_cookie_max_age;
        let expires_at = Utc::now() + Duration::seconds(ttl as i64);

        let csrf_token = gen_random_string(32)?;
        let state_id = gen_random_string(32)?;
        let pkce_verifier = gen_random_string(32)?;
        let pkce_challenge = base64url_encode(Sha256::digest(pkce_verifier.as_bytes()).to_vec())?;

        let stored = StoredState {
            provider: config.kind,
            csrf_token: csrf_token.clone(),
            pkce_verifier,
            expires_at,
            ttl,
        };
        let data: CacheData = stored.try_into()?;
        self.cache
            .lock()
            .await
            .put_with_ttl(STATE_PREFIX, &state_id, data, ttl as usize)
            .await?;

        let auth_url = Url::parse_with_params(
            &config.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("scope", config.scope.as_str()),
                ("state", state_id.as_str()),
                ("code_challenge", pkce_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| ProviderError::Serde(format!("Invalid authorization URL: {e}")))?;

        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            &self.csrf_cookie_name,
            &csrf_token,
            ttl as i64,
        )
        .map_err(|e| ProviderError::Cookie(e.to_string()))?;

        tracing::debug!("Auth URL: {}", auth_url);
        Ok((auth_url.to_string(), headers))
    }

    /// Validate the redirect back from the provider and fetch the user's profile.
    #[tracing::instrument(skip(self, config, response, headers), fields(provider = %config.kind))]
    pub async fn complete_auth(
        &self,
        config: &ProviderConfig,
        response: &AuthResponse,
        headers: &HeaderMap,
    ) -> Result<ProviderCallback, ProviderError> {
        if let Some(error) = &response.error {
            tracing::debug!("Provider returned error: {}", error);
            return Err(ProviderError::Denied(error.clone()));
        }

        let stored = self.csrf_checks(config, response, headers).await?;

        let code = response
            .code
            .as_deref()
            .ok_or_else(|| ProviderError::TokenExchange("No authorization code".to_string()))?;

        let token = self
            .exchange_code_for_token(config, code, &stored.pkce_verifier)
            .await?;
        let raw = self.fetch_user_info(config, &token.access_token).await?;
        let profile = adapter_for(config.kind).normalize(&raw)?;

        tracing::debug!(provider_user_id = %profile.id, "Provider profile normalized");

        Ok(ProviderCallback {
            profile,
            credentials: ProviderCredentials {
                access_token: token.access_token,
                token_secret: None,
            },
        })
    }

    /// Consume the stored state. It is removed before any check so it can be used once only.
    async fn take_state(&self, state_id: &str) -> Result<StoredState, ProviderError> {
        let mut cache = self.cache.lock().await;
        let data = cache
            .get(STATE_PREFIX, state_id)
            .await?
            .ok_or_else(|| {
                ProviderError::SecurityTokenNotFound("Unknown or used state".to_string())
            })?;
        cache.remove(STATE_PREFIX, state_id).await?;
        data.try_into()
    }

    async fn csrf_checks(
        &self,
        config: &ProviderConfig,
        response: &AuthResponse,
        headers: &HeaderMap,
    ) -> Result<StoredState, ProviderError> {
        let stored = self.take_state(&response.state).await?;

        if stored.provider != config.kind {
            tracing::error!(
                "State issued for {} used on {} callback",
                stored.provider,
                config.kind
            );
            return Err(ProviderError::ProviderMismatch {
                expected: stored.provider,
                actual: config.kind,
            });
        }

        if Utc::now() > stored.expires_at {
            tracing::error!("CSRF Expires At: {:#?}", stored.expires_at);
            return Err(ProviderError::CsrfTokenExpired);
        }

        let cookie = get_cookie_value(headers, &self.csrf_cookie_name).ok_or_else(|| {
            ProviderError::SecurityTokenNotFound("No CSRF session cookie found".to_string())
        })?;

        if !bool::from(cookie.as_bytes().ct_eq(stored.csrf_token.as_bytes())) {
            tracing::error!("CSRF token in cookie does not match stored token");
            return Err(ProviderError::CsrfTokenMismatch);
        }

        Ok(stored)
    }

    async fn exchange_code_for_token(
        &self,
        config: &ProviderConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, ProviderError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
            ("client_id", config.client_id.as_str()),
        ];

        let mut request = self
            .http
            .post(&config.token_url)
            .header(http::header::ACCEPT, "application/json");
        match config.token_auth {
            TokenAuthMethod::ClientSecretPost => {
                form.push(("client_secret", config.client_secret.as_str()));
            }
            TokenAuthMethod::ClientSecretBasic => {
                request = request.basic_auth(&config.client_id, Some(&config.client_secret));
            }
        }

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!("Token Exchange Response: {} {}", status, body);
            return Err(ProviderError::TokenExchange(status.to_string()));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;
        tracing::debug!(token_type = ?token.token_type, "Token exchange succeeded");
        Ok(token)
    }

    async fn fetch_user_info(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .http
            .get(&config.userinfo_url)
            .bearer_auth(access_token)
            .header(http::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::FetchUserInfo(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::FetchUserInfo(status.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::FetchUserInfo(e.to_string()))?;
        tracing::debug!("Response Body: {:#?}", body);

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Serde(format!("Failed to deserialize response body: {e}")))
    }
}
