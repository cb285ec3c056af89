//! Error types for the coordination layer

use thiserror::Error;

use crate::provider::ProviderError;
use crate::session::{FlashMessage, SessionError};
use crate::userdb::{ProviderKind, UserError};
use crate::utils::UtilError;

/// Errors that can occur during authentication coordination
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// No account with this email
    #[error("Email {email} not found.")]
    NotFound { email: String },

    /// Wrong password, or no password on the account
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The provider identity belongs to another account
    #[error("There is already a {} account that belongs to you. Sign in with that account or delete it, then link it with your current account.", .0.display_name())]
    ProviderAlreadyLinked(ProviderKind),

    #[error("Account with the email address {0} already exists.")]
    EmailTaken(String),

    /// Rejected form input
    #[error("{0}")]
    Validation(String),

    /// Unauthorized access error
    #[error("Unauthorized access")]
    Unauthorized,

    #[error("User error: {0}")]
    Store(UserError),

    #[error("Session error: {0}")]
    Session(SessionError),

    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("Utils error: {0}")]
    Utils(UtilError),
}

impl CoordinationError {
    /// Outcomes caused by the request itself rather than by a fault.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidCredentials
                | Self::ProviderAlreadyLinked(_)
                | Self::EmailTaken(_)
                | Self::Validation(_)
        )
    }

    /// Flash message to show the user, for expected outcomes only.
    pub fn flash(&self) -> Option<FlashMessage> {
        self.is_expected().then(|| FlashMessage::errors(self.to_string()))
    }

    /// Log the error at a level matching its kind and return self
    pub fn log(self) -> Self {
        if self.is_expected() {
            tracing::debug!("{}", self);
        } else {
            tracing::error!("{}", self);
        }
        self
    }
}

// Conversions from lower layers are faults and are logged as they happen.

impl From<UserError> for CoordinationError {
    fn from(err: UserError) -> Self {
        let error = Self::Store(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        let error = Self::Session(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<ProviderError> for CoordinationError {
    fn from(err: ProviderError) -> Self {
        let error = Self::Provider(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        let error = Self::Utils(err);
        tracing::error!("{}", error);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            CoordinationError::NotFound {
                email: "Bob@Example.com".to_string()
            }
            .to_string(),
            "Email Bob@Example.com not found."
        );
        assert_eq!(
            CoordinationError::InvalidCredentials.to_string(),
            "Invalid email or password."
        );
        assert_eq!(
            CoordinationError::ProviderAlreadyLinked(ProviderKind::Twitter).to_string(),
            "There is already a Twitter account that belongs to you. Sign in with that account or delete it, then link it with your current account."
        );
    }

    #[test]
    fn test_expected_errors_flash() {
        // Given an expected outcome
        let err = CoordinationError::EmailTaken("a@b.c".to_string());

        // Then it carries an errors-level flash
        let flash = err.flash().unwrap();
        assert_eq!(flash.level, FlashLevel::Errors);
        assert_eq!(flash.msg, "Account with the email address a@b.c already exists.");
    }

    #[test]
    fn test_faults_do_not_flash() {
        let err = CoordinationError::from(UserError::Storage("disk full".to_string()));
        assert!(!err.is_expected());
        assert!(err.flash().is_none());
        assert!(!CoordinationError::Unauthorized.is_expected());
    }
}
