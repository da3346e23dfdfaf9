use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application error
///
/// Every fail-path in the service collapses to one of these kinds. The HTTP
/// projection (status code + machine-readable code) lives in `IntoResponse`;
/// underlying store errors are logged server-side and never leak to clients.
#[derive(Debug)]
pub enum AppError {
    // Database errors
    Database(sqlx::Error),

    // Malformed input (failed validation rules)
    Validation(String),

    // Protocol-level refusal (e.g. OAuth exchange failed)
    BadRequest(String),

    // Bad credentials, invalid/expired token, disabled account
    AuthFailure(String),

    // Caller authenticated but lacks the required role
    Forbidden(String),

    // Project/user/token/provider absent
    NotFound(String),

    // Duplicate email/name/id
    Conflict(String),

    // A rate-limit rule tripped; retry hint in seconds
    RateLimited { retry_after_seconds: i64 },

    // Email dispatch failed; reported but callers usually swallow this
    EmailSendFailed(String),

    // Storage or unexpected failure
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::AuthFailure(msg) => write!(f, "Authentication failed: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::RateLimited { retry_after_seconds } => {
                write!(f, "Rate limited, retry after {}s", retry_after_seconds)
            },
            AppError::EmailSendFailed(msg) => write!(f, "Email send failed: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Machine-readable error code for the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "INTERNAL_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::AuthFailure(_) => "AUTH_FAILURE",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::EmailSendFailed(_) => "EMAIL_SEND_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::EmailSendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients (store errors are redacted)
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            },
            AppError::EmailSendFailed(msg) => {
                tracing::error!("Email send failed: {}", msg);
                "Failed to send email".to_string()
            },
            AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::AuthFailure(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::RateLimited { retry_after_seconds } => {
                format!("Too many attempts, retry after {} seconds", retry_after_seconds)
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.client_message();

        let mut body = json!({
            "success": false,
            "error": message,
            "code": code,
            "statusCode": status.as_u16(),
        });

        if let AppError::RateLimited { retry_after_seconds } = &self {
            body["retryAfterSeconds"] = json!(retry_after_seconds);
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuthFailure("Invalid credentials".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("role".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("project".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("duplicate".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimited { retry_after_seconds: 300 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_redacted() {
        let err = AppError::Internal("connection refused at 10.0.0.5:5432".into());
        assert_eq!(err.client_message(), "Internal server error");

        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_rate_limited_carries_retry_hint() {
        let err = AppError::RateLimited { retry_after_seconds: 900 };
        assert_eq!(err.code(), "RATE_LIMITED");
        assert!(err.client_message().contains("900"));
    }
}
