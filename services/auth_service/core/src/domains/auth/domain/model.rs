use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// End-user entity, stored in the owning project's dedicated user table
///
/// Rows with status=deleted are tombstoned, not removed; a fresh registration
/// for a tombstoned email revives the row with new credentials.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Unique within the project, case-sensitive as stored
    pub email: String,
    pub email_verified: bool,
    pub phone: Option<String>,
    pub phone_verified: bool,
    /// NULL for OAuth-only users
    pub password_hash: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_provider_user_id: Option<String>,
    pub oauth_raw_user_data: Option<sqlx::types::Json<serde_json::Value>>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub metadata: Option<sqlx::types::Json<serde_json::Value>>,
    /// One of: active, suspended, deleted
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

pub const USER_STATUSES: &[&str] = &["active", "suspended", "deleted"];

/// Refresh token row
///
/// Only the SHA-256 of the issued token is stored. Rotation revokes the old
/// row (reason "rotated") atomically with inserting the next one.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub project_id: String,
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn new(
        project_id: &str,
        user_id: Uuid,
        token_hash: String,
        ttl_seconds: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            project_id: project_id.to_string(),
            user_id,
            token_hash,
            device_name: None,
            user_agent,
            ip_address,
            expires_at: now + chrono::Duration::seconds(ttl_seconds),
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            created_at: now,
            last_used_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Single-use token row, shared by password reset and email confirmation
///
/// The consuming operation is the only distinction between the two flows.
/// `used_at` transitions null -> timestamp exactly once.
#[derive(Debug, Clone, FromRow)]
pub struct SingleUseToken {
    pub id: Uuid,
    pub project_id: String,
    pub user_id: Uuid,
    pub email: String,
    pub token_hash: String,
    /// Unix seconds
    pub expires_at: i64,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Password-reset token lifetime
pub const RESET_TOKEN_TTL_SECONDS: i64 = 3_600;
/// Email-confirmation token lifetime
pub const CONFIRM_TOKEN_TTL_SECONDS: i64 = 86_400;

impl SingleUseToken {
    pub fn new(
        project_id: &str,
        user_id: Uuid,
        email: &str,
        token_hash: String,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            project_id: project_id.to_string(),
            user_id,
            email: email.to_string(),
            token_hash,
            expires_at: now.timestamp() + ttl_seconds,
            used_at: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_used()
    }
}

/// One authentication try, recorded for rate limiting and audit
#[derive(Debug, Clone, FromRow)]
pub struct AuthAttempt {
    pub id: Uuid,
    pub project_id: String,
    /// One of: login, register, password_reset, oauth, refresh
    pub attempt_type: String,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AuthAttempt {
    pub fn success(
        project_id: &str,
        attempt_type: &str,
        email: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
        user_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id: project_id.to_string(),
            attempt_type: attempt_type.to_string(),
            email,
            ip_address,
            user_agent,
            success: true,
            failure_reason: None,
            user_id,
            created_at: Utc::now(),
        }
    }

    pub fn failure(
        project_id: &str,
        attempt_type: &str,
        email: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: &str,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id: project_id.to_string(),
            attempt_type: attempt_type.to_string(),
            email,
            ip_address,
            user_agent,
            success: false,
            failure_reason: Some(reason.to_string()),
            user_id: None,
            created_at: Utc::now(),
        }
    }
}

pub const ATTEMPT_TYPES: &[&str] = &["login", "register", "password_reset", "oauth", "refresh"];
