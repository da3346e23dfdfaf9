use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use super::model::{AuthAttempt, RefreshToken, SingleUseToken, User};

/// User repository over a project's dynamic user table
///
/// Every method takes the owning project's user-table name; implementations
/// sanitize it before interpolation. Lookup methods exclude tombstoned rows
/// unless the name says otherwise.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(
        &self,
        user_table: &str,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    /// Includes status=deleted rows; used by the reactivation rule
    async fn find_by_email_any_status(
        &self,
        user_table: &str,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, user_table: &str, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_oauth_identity(
        &self,
        user_table: &str,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, AppError>;

    async fn create(&self, user_table: &str, user: &User) -> Result<User, AppError>;

    async fn update(&self, user_table: &str, user: &User) -> Result<User, AppError>;

    async fn update_password(
        &self,
        user_table: &str,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>;

    async fn update_last_login(&self, user_table: &str, id: Uuid) -> Result<(), AppError>;

    async fn set_email_verified(&self, user_table: &str, id: Uuid) -> Result<(), AppError>;

    async fn set_status(&self, user_table: &str, id: Uuid, status: &str)
        -> Result<(), AppError>;

    async fn list(
        &self,
        user_table: &str,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<User>, i64), AppError>;
}

/// Refresh token repository (fixed table, hash-at-rest)
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError>;

    /// Lookup by hash regardless of revocation state; callers inspect
    /// `revoked` to distinguish replay from a live token
    async fn find_by_hash(
        &self,
        project_id: &str,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, AppError>;

    /// Rotation: revoke the old row (reason "rotated", last_used_at touched)
    /// and insert the replacement as one transaction
    async fn rotate(
        &self,
        old_id: Uuid,
        replacement: &RefreshToken,
    ) -> Result<RefreshToken, AppError>;

    async fn revoke(&self, id: Uuid, reason: &str) -> Result<(), AppError>;

    async fn revoke_all_for_user(
        &self,
        project_id: &str,
        user_id: Uuid,
        reason: &str,
    ) -> Result<u64, AppError>;

    async fn delete_expired(&self) -> Result<u64, AppError>;
}

/// Single-use token repository (password reset + email confirmation)
#[async_trait]
pub trait SingleUseTokenRepository: Send + Sync {
    async fn create(&self, token: &SingleUseToken) -> Result<SingleUseToken, AppError>;

    async fn find_by_hash(
        &self,
        project_id: &str,
        token_hash: &str,
    ) -> Result<Option<SingleUseToken>, AppError>;

    /// Consume the token; returns false when it was already used
    async fn mark_used(&self, id: Uuid) -> Result<bool, AppError>;

    /// Mark all of a user's unused tokens as used
    async fn mark_all_used_for_user(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError>;

    /// Drop tokens expired for longer than the retention window
    async fn delete_expired_before(&self, cutoff_unix: i64) -> Result<u64, AppError>;
}

/// Append-only auth attempt log, queried over sliding windows
#[async_trait]
pub trait AuthAttemptRepository: Send + Sync {
    async fn record(&self, attempt: &AuthAttempt) -> Result<(), AppError>;

    /// Count failed attempts inside the window; `ip_address`/`email` narrow
    /// the scope for per_ip/per_email rules, both None means per_project
    async fn count_recent_failures(
        &self,
        project_id: &str,
        window_seconds: i64,
        ip_address: Option<&str>,
        email: Option<&str>,
    ) -> Result<i64, AppError>;
}
