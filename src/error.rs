/// Application error handling
///
/// Every failure inside the service is an `AppError`. Each variant carries the private
/// cause (logged, never serialized) and maps to exactly one public `ErrorKind`, which is
/// all a client ever sees. Credential failures in particular collapse into a handful of
/// kinds so that callers cannot tell an expired token from a tampered one, or a wrong
/// password from an unknown account.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::auth::TokenError;
use crate::store::StoreError;

// ============================================================================
// DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(String, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(String, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(String),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(String),
}

/// Authentication and authorization failures.
///
/// The variants record *why* a credential was rejected. Outward they are reduced to
/// `InvalidCredentials`, `Unauthorized` or `Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing or malformed authorization header: {0}")]
    MissingCredentials(&'static str),
    #[error("Access token rejected: {0}")]
    AccessToken(TokenError),
    #[error("Refresh token not found")]
    RefreshTokenNotFound,
    #[error("Refresh token has been revoked")]
    RefreshTokenRevoked,
    #[error("Refresh token has expired")]
    RefreshTokenExpired,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Caller does not own the resource")]
    Forbidden,
}

// ============================================================================
// UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Unsupported content type")]
    UnsupportedMediaType,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The public shape of an error: status code, machine-readable code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidCredentials,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UnsupportedMediaType,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidCredentials | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "DUPLICATE_ENTRY",
            ErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ErrorKind::Unavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    fn generic_message(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Invalid request",
            ErrorKind::InvalidCredentials => "Invalid email or password",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not found",
            ErrorKind::Conflict => "Resource already exists",
            ErrorKind::UnsupportedMediaType => "Unsupported media type",
            ErrorKind::Unavailable => "Service temporarily unavailable",
            ErrorKind::Internal => "Internal server error",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Auth(AuthError::InvalidCredentials) => ErrorKind::InvalidCredentials,
            AppError::Auth(AuthError::Forbidden) => ErrorKind::Forbidden,
            AppError::Auth(_) => ErrorKind::Unauthorized,
            AppError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            AppError::Store(StoreError::Unavailable(_)) => ErrorKind::Unavailable,
            AppError::Store(StoreError::Backend(_)) => ErrorKind::Internal,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::UnsupportedMediaType => ErrorKind::UnsupportedMediaType,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show a client.
    ///
    /// Validation and not-found messages describe the caller's own input; everything else
    /// is replaced by the kind's generic text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::NotFound(_) => self.to_string(),
            _ => self.kind().generic_message().to_string(),
        }
    }

    fn log(&self, request_id: &str) {
        match self.kind() {
            ErrorKind::Internal | ErrorKind::Unavailable => {
                tracing::error!(request_id = request_id, error = %self, "Request failed");
            }
            ErrorKind::InvalidCredentials | ErrorKind::Unauthorized | ErrorKind::Forbidden => {
                tracing::warn!(request_id = request_id, reason = %self, "Authentication error");
            }
            _ => {
                tracing::info!(request_id = request_id, error = %self, "Request rejected");
            }
        }
    }
}

// ============================================================================
// HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log(&request_id);

        let kind = self.kind();
        let body = ErrorResponse::new(
            request_id,
            self.public_message(),
            kind.code().to_string(),
            kind.status().as_u16(),
        );

        HttpResponse::build(kind.status()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.kind().status()
    }
}

// ============================================================================
// ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to structured log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::InvalidFormat("test".to_string()).into();
        assert!(matches!(app_err, AppError::Validation(_)));
        assert_eq!(app_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_token_failures_share_one_public_shape() {
        let errors = [
            AppError::from(AuthError::AccessToken(TokenError::Expired)),
            AppError::from(AuthError::AccessToken(TokenError::InvalidSignature)),
            AppError::from(AuthError::AccessToken(TokenError::Malformed)),
            AppError::from(AuthError::RefreshTokenRevoked),
            AppError::from(AuthError::RefreshTokenExpired),
            AppError::from(AuthError::RefreshTokenNotFound),
            AppError::from(AuthError::MissingCredentials("missing")),
            AppError::from(AuthError::InvalidApiKey),
        ];

        for err in &errors {
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "Unauthorized");
        }
    }

    #[test]
    fn test_forbidden_is_distinct_from_unauthorized() {
        let err = AppError::from(AuthError::Forbidden);
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_invalid_credentials_message_hides_cause() {
        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), "Invalid email or password");
    }

    #[test]
    fn test_store_errors_do_not_leak_detail() {
        let err = AppError::from(StoreError::Backend("relation \"users\" does not exist".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");

        let conflict = AppError::from(StoreError::Conflict("users_email_key".into()));
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unsupported_media_type_is_415() {
        let err = AppError::UnsupportedMediaType;
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.kind().code(), "UNSUPPORTED_MEDIA_TYPE");
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::new(
            "test-123".to_string(),
            "Test error".to_string(),
            "TEST_ERROR".to_string(),
            400,
        );

        assert_eq!(response.error_id, "test-123");
        assert_eq!(response.code, "TEST_ERROR");
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("test_operation");
        assert_eq!(ctx.operation, "test_operation");
        assert!(ctx.user_id.is_none());

        let ctx_with_user = ctx.with_user_id("user-123");
        assert_eq!(ctx_with_user.user_id, Some("user-123".to_string()));
    }
}
