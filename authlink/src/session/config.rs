/// Session cookie settings (`SESSION_COOKIE_NAME`, `SESSION_COOKIE_MAX_AGE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Lifetime in seconds of both the cookie and the stored session.
    pub max_age: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "__Host-SessionId".to_string(),
            max_age: 86400,
        }
    }
}
