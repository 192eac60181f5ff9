use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::error::Error as StdError;

#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
    Configuration(String),
    Validation(String),
    External(String),
    Serialization(String),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    error_type: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(e) => write!(f, "Bad request: {}", e),
            AppError::NotFound(e) => write!(f, "Not found: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::External(e) => write!(f, "External service error: {}", e),
            AppError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl StdError for AppError {}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Configuration(_) => "configuration_error",
            AppError::Validation(_) => "validation_error",
            AppError::External(_) => "external_service_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        let error_response = ErrorResponse {
            code: status_code.as_u16(),
            message: self.to_string(),
            error_type: self.error_type().to_string(),
        };

        HttpResponse::build(status_code).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Serialization(format!("JSON deserialization/serialization error: {}", error))
    }
}

/// Failures of confirmation token issuance and verification.
///
/// The confirm endpoint collapses the verification kinds into one generic
/// redirect; the distinct kind is only kept for logs and debug responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token")]
    MalformedToken,
    #[error("Bad signature")]
    BadSignature,
    #[error("Expired")]
    Expired,
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),
    #[error("Signing configuration error: {0}")]
    ConfigurationError(String),
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
            TokenError::InvalidSubject(_) => "invalid_subject",
            TokenError::ConfigurationError(_) => "configuration",
            TokenError::Encoding(_) => "encoding",
        }
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::ConfigurationError(msg) => AppError::Configuration(msg),
            TokenError::InvalidSubject(msg) => AppError::Validation(msg),
            TokenError::Encoding(msg) => AppError::Serialization(msg),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

// Define AppResult type alias for Result<T, AppError>
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_messages_are_generic() {
        assert_eq!(TokenError::MalformedToken.to_string(), "Invalid token");
        assert_eq!(TokenError::BadSignature.to_string(), "Bad signature");
        assert_eq!(TokenError::Expired.to_string(), "Expired");
    }

    #[test]
    fn test_token_error_maps_to_app_error() {
        assert!(matches!(
            AppError::from(TokenError::ConfigurationError("missing".to_string())),
            AppError::Configuration(_)
        ));
        assert!(matches!(AppError::from(TokenError::Expired), AppError::BadRequest(_)));
        assert!(matches!(
            AppError::from(TokenError::InvalidSubject("empty".to_string())),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::External("smtp".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Configuration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
