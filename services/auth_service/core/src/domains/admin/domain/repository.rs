use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use uuid::Uuid;

use super::model::{AdminSession, AdminUser};

/// Admin identity repository
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn create(&self, admin: &AdminUser) -> Result<AdminUser, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError>;

    async fn list(&self) -> Result<Vec<AdminUser>, AppError>;

    async fn update(&self, admin: &AdminUser) -> Result<AdminUser, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn update_last_login(&self, id: Uuid) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

/// Admin session repository (hash-at-rest bearer tokens)
#[async_trait]
pub trait AdminSessionRepository: Send + Sync {
    async fn create(&self, session: &AdminSession) -> Result<AdminSession, AppError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError>;

    /// Slide the expiry window and stamp last activity
    async fn extend(
        &self,
        id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError>;

    async fn delete_all_for_admin(&self, admin_user_id: Uuid) -> Result<u64, AppError>;

    async fn delete_expired(&self) -> Result<u64, AppError>;
}
