//! Request-gating rules shared by the HTTP middleware.

use crate::userdb::User;

/// The provider named by the final `/`-separated segment of `path`.
///
/// `/api/twitter` gives `twitter`; a trailing slash gives an empty name.
pub fn provider_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// True when the user holds an access token of the named provider.
pub fn is_authorized(user: &User, provider: &str) -> bool {
    user.tokens.iter().any(|token| token.kind.as_str() == provider)
}

/// Paths remembered as the destination after a later login.
pub fn is_return_to_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    path == "/" || lower.contains("api") || lower.contains("contact")
}
