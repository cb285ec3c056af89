use http::{Result as HttpResponse, StatusCode};

use authlink::{CoordinationError, ProviderError, SessionError};

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

fn provider_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::NotConfigured(_) => StatusCode::NOT_FOUND,
        ProviderError::Denied(_)
        | ProviderError::SecurityTokenNotFound(_)
        | ProviderError::CsrfTokenMismatch
        | ProviderError::CsrfTokenExpired
        | ProviderError::ProviderMismatch { .. } => StatusCode::BAD_REQUEST,
        ProviderError::TokenExchange(_)
        | ProviderError::FetchUserInfo(_)
        | ProviderError::InvalidProfile(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn status_of(err: &CoordinationError) -> StatusCode {
    match err {
        CoordinationError::Unauthorized => StatusCode::UNAUTHORIZED,
        CoordinationError::NotFound { .. }
        | CoordinationError::InvalidCredentials
        | CoordinationError::Validation(_) => StatusCode::BAD_REQUEST,
        CoordinationError::ProviderAlreadyLinked(_) | CoordinationError::EmailTaken(_) => {
            StatusCode::CONFLICT
        }
        CoordinationError::Provider(e) => provider_status(e),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (status_of(&e), e.to_string()))
    }
}

impl<T> IntoResponseError<T> for Result<T, ProviderError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (provider_status(&e), e.to_string()))
    }
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("Session error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authlink::{ProviderKind, UserError};

    fn status(err: CoordinationError) -> StatusCode {
        let result: Result<(), CoordinationError> = Err(err);
        result.into_response_error().unwrap_err().0
    }

    #[test]
    fn test_coordination_error_unauthorized() {
        assert_eq!(status(CoordinationError::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expected_errors_are_client_errors() {
        assert_eq!(
            status(CoordinationError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CoordinationError::ProviderAlreadyLinked(ProviderKind::GitHub)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(CoordinationError::EmailTaken("a@example.com".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_store_fault_is_server_error() {
        let err = CoordinationError::Store(UserError::Storage("down".to_string()));
        assert_eq!(status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_upstream_failure_is_bad_gateway() {
        let err = CoordinationError::Provider(ProviderError::TokenExchange("500".to_string()));
        assert_eq!(status(err), StatusCode::BAD_GATEWAY);

        let result: Result<(), ProviderError> = Err(ProviderError::CsrfTokenMismatch);
        let (code, message) = result.into_response_error().unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Csrf token mismatch");
    }

    #[test]
    fn test_success_case() {
        let result: Result<String, CoordinationError> = Ok("Success".to_string());
        assert_eq!(result.into_response_error().unwrap(), "Success");
    }

    #[test]
    fn test_http_error() {
        let result: HttpResponse<String> = Err(StatusCode::from_u16(1000).unwrap_err().into());
        let (code, _) = result.into_response_error().unwrap_err();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
