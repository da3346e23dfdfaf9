use async_trait::async_trait;
use auth_service_core::domains::admin::domain::{
    model::{AdminSession, AdminUser},
    repository::{AdminSessionRepository, AdminUserRepository},
};
use chrono::{DateTime, Utc};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of AdminUserRepository
#[derive(Clone)]
pub struct PgAdminUserRepository {
    pool: PgPool,
}

impl PgAdminUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserRepository for PgAdminUserRepository {
    async fn create(&self, admin: &AdminUser) -> Result<AdminUser, AppError> {
        let created = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (
                id, email, password_hash, name, role, enabled,
                last_login_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(admin.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.name)
        .bind(&admin.role)
        .bind(admin.enabled)
        .bind(admin.last_login_at)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError> {
        let admin = sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
        let admin = sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    async fn list(&self) -> Result<Vec<AdminUser>, AppError> {
        let admins =
            sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(admins)
    }

    async fn update(&self, admin: &AdminUser) -> Result<AdminUser, AppError> {
        let updated = sqlx::query_as::<_, AdminUser>(
            r#"
            UPDATE admin_users
            SET name = $2, role = $3, enabled = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.role)
        .bind(admin.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE admin_users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Admin not found".to_string()));
        }
        Ok(())
    }

    async fn update_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE admin_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

/// PostgreSQL implementation of AdminSessionRepository
#[derive(Clone)]
pub struct PgAdminSessionRepository {
    pool: PgPool,
}

impl PgAdminSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminSessionRepository for PgAdminSessionRepository {
    async fn create(&self, session: &AdminSession) -> Result<AdminSession, AppError> {
        let created = sqlx::query_as::<_, AdminSession>(
            r#"
            INSERT INTO admin_sessions (
                id, admin_user_id, token_hash, ip_address, user_agent,
                expires_at, last_activity_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(session.id)
        .bind(session.admin_user_id)
        .bind(&session.token_hash)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError> {
        let session = sqlx::query_as::<_, AdminSession>(
            "SELECT * FROM admin_sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE admin_sessions SET expires_at = $2, last_activity_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_admin(&self, admin_user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE admin_user_id = $1")
            .bind(admin_user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
