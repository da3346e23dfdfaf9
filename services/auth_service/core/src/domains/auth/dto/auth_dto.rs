use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::domains::auth::domain::model::User;

/// Request metadata captured from the transport layer
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Standard error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResp {
    /// Error message
    #[schema(example = "Invalid credentials")]
    pub error: String,

    /// Error code for client-side handling
    #[schema(example = "AUTH_FAILURE")]
    pub code: Option<String>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResp {
    #[schema(example = "ok")]
    pub status: String,

    #[schema(example = "0.1.0")]
    pub version: String,

    pub timestamp: DateTime<Utc>,
}

/// User registration request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterReq {
    /// Email address (unique within the project)
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,

    /// Password: 8-72 chars with at least one lowercase, one uppercase and
    /// one digit
    #[validate(length(min = 8, max = 72))]
    #[schema(example = "SecurePass123", min_length = 8, max_length = 72)]
    pub password: String,

    /// Display name
    #[schema(example = "Jane Doe")]
    pub display_name: Option<String>,
}

/// Login request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginReq {
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1))]
    #[schema(example = "SecurePass123")]
    pub password: String,
}

/// Refresh request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct RefreshReq {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Logout request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct LogoutReq {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Forgot-password request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct ForgotPasswordReq {
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// Forgot-password response; identical whether or not the email exists
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordResp {
    pub message: String,
    #[schema(example = "u***@example.com")]
    pub email_masked: String,
}

/// Reset-password request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct ResetPasswordReq {
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(length(min = 8, max = 72))]
    pub new_password: String,
}

/// Confirm-email query parameters
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConfirmEmailQuery {
    pub token: String,
}

/// Access + refresh token pair
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResp {
    pub access_token: String,
    pub refresh_token: String,

    #[schema(example = "Bearer")]
    pub token_type: String,

    /// Access token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Authentication response with tokens and the user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResp {
    pub access_token: String,
    pub refresh_token: String,

    #[schema(example = "Bearer")]
    pub token_type: String,

    #[schema(example = 3600)]
    pub expires_in: i64,

    pub user: UserInfo,
}

/// User information returned in auth responses
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserInfo {
    pub id: Uuid,

    #[schema(example = "user@example.com")]
    pub email: String,

    pub email_verified: bool,

    #[schema(example = "Jane Doe")]
    pub display_name: Option<String>,

    pub avatar_url: Option<String>,

    pub oauth_provider: Option<String>,

    #[schema(example = "active")]
    pub status: String,

    pub created_at: DateTime<Utc>,

    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            email_verified: user.email_verified,
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            oauth_provider: user.oauth_provider.clone(),
            status: user.status.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Paginated user listing (admin surface)
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserListResp {
    pub users: Vec<UserInfo>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Mask an email for responses: keep the first character and the domain
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap();
            format!("{}***@{}", first, domain)
        },
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_req_validation() {
        let req = RegisterReq {
            email: "user@example.com".into(),
            password: "SecurePass123".into(),
            display_name: None,
        };
        assert!(req.validate().is_ok());

        let req = RegisterReq {
            email: "not-an-email".into(),
            password: "SecurePass123".into(),
            display_name: None,
        };
        assert!(req.validate().is_err());

        let req = RegisterReq {
            email: "user@example.com".into(),
            password: "short".into(),
            display_name: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("user@example.com"), "u***@example.com");
        assert_eq!(mask_email("a@x.io"), "a***@x.io");
        assert_eq!(mask_email("garbage"), "***");
    }
}
