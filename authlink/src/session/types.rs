use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::session::errors::SessionError;
use crate::storage::CacheData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Errors,
    Info,
    Success,
}

/// One-time notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub msg: String,
}

impl FlashMessage {
    pub fn errors(msg: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Errors,
            msg: msg.into(),
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            msg: msg.into(),
        }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            msg: msg.into(),
        }
    }
}

/// Flash messages grouped by level, ready for a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub errors: Vec<String>,
    pub info: Vec<String>,
    pub success: Vec<String>,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.info.is_empty() && self.success.is_empty()
    }
}

impl From<Vec<FlashMessage>> for Flash {
    fn from(messages: Vec<FlashMessage>) -> Self {
        let mut flash = Flash::default();
        for m in messages {
            match m.level {
                FlashLevel::Errors => flash.errors.push(m.msg),
                FlashLevel::Info => flash.info.push(m.msg),
                FlashLevel::Success => flash.success.push(m.msg),
            }
        }
        flash
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredSession {
    pub(super) user_id: Option<String>,
    #[serde(default)]
    pub(super) flash: Vec<FlashMessage>,
    pub(super) return_to: Option<String>,
    pub(super) expires_at: DateTime<Utc>,
    pub(super) ttl: u64,
}

impl StoredSession {
    pub(super) fn new(user_id: Option<String>, ttl: u64) -> Self {
        Self {
            user_id,
            flash: Vec::new(),
            return_to: None,
            expires_at: Utc::now() + Duration::seconds(ttl as i64),
            ttl,
        }
    }

    pub(super) fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Seconds left before expiry, at least one.
    pub(super) fn remaining_ttl(&self) -> u64 {
        (self.expires_at - Utc::now()).num_seconds().max(1) as u64
    }
}

impl TryFrom<&StoredSession> for CacheData {
    type Error = SessionError;

    fn try_from(session: &StoredSession) -> Result<Self, Self::Error> {
        Ok(Self {
            value: serde_json::to_string(session)?,
        })
    }
}

impl TryFrom<CacheData> for StoredSession {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        Ok(serde_json::from_str(&data.value)?)
    }
}
