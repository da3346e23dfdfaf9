use async_trait::async_trait;
use auth_service_core::domains::auth::domain::{
    model::{RefreshToken, SingleUseToken},
    repository::{RefreshTokenRepository, SingleUseTokenRepository},
};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of RefreshTokenRepository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_REFRESH_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (
        id, project_id, user_id, token_hash, device_name, user_agent, ip_address,
        expires_at, revoked, revoked_at, revoked_reason, created_at, last_used_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    RETURNING *
"#;

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError> {
        let created = sqlx::query_as::<_, RefreshToken>(INSERT_REFRESH_TOKEN)
            .bind(token.id)
            .bind(&token.project_id)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(&token.device_name)
            .bind(&token.user_agent)
            .bind(&token.ip_address)
            .bind(token.expires_at)
            .bind(token.revoked)
            .bind(token.revoked_at)
            .bind(&token.revoked_reason)
            .bind(token.created_at)
            .bind(token.last_used_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_hash(
        &self,
        project_id: &str,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, AppError> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE project_id = $1 AND token_hash = $2",
        )
        .bind(project_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        replacement: &RefreshToken,
    ) -> Result<RefreshToken, AppError> {
        let mut tx = self.pool.begin().await?;

        // The old row must still be live; a concurrent rotation loses here
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE,
                revoked_at = NOW(),
                revoked_reason = 'rotated',
                last_used_at = NOW()
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::AuthFailure("Invalid refresh token".to_string()));
        }

        let created = sqlx::query_as::<_, RefreshToken>(INSERT_REFRESH_TOKEN)
            .bind(replacement.id)
            .bind(&replacement.project_id)
            .bind(replacement.user_id)
            .bind(&replacement.token_hash)
            .bind(&replacement.device_name)
            .bind(&replacement.user_agent)
            .bind(&replacement.ip_address)
            .bind(replacement.expires_at)
            .bind(replacement.revoked)
            .bind(replacement.revoked_at)
            .bind(&replacement.revoked_reason)
            .bind(replacement.created_at)
            .bind(replacement.last_used_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn revoke(&self, id: Uuid, reason: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW(), revoked_reason = $2
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        project_id: &str,
        user_id: Uuid,
        reason: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW(), revoked_reason = $3
            WHERE project_id = $1 AND user_id = $2 AND revoked = FALSE
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// PostgreSQL implementation of SingleUseTokenRepository
#[derive(Clone)]
pub struct PgSingleUseTokenRepository {
    pool: PgPool,
}

impl PgSingleUseTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SingleUseTokenRepository for PgSingleUseTokenRepository {
    async fn create(&self, token: &SingleUseToken) -> Result<SingleUseToken, AppError> {
        let created = sqlx::query_as::<_, SingleUseToken>(
            r#"
            INSERT INTO single_use_tokens (
                id, project_id, user_id, email, token_hash, expires_at, used_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(token.id)
        .bind(&token.project_id)
        .bind(token.user_id)
        .bind(&token.email)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_hash(
        &self,
        project_id: &str,
        token_hash: &str,
    ) -> Result<Option<SingleUseToken>, AppError> {
        let token = sqlx::query_as::<_, SingleUseToken>(
            "SELECT * FROM single_use_tokens WHERE project_id = $1 AND token_hash = $2",
        )
        .bind(project_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, AppError> {
        // used_at transitions null -> timestamp exactly once
        let result = sqlx::query(
            "UPDATE single_use_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_used_for_user(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE single_use_tokens
            SET used_at = NOW()
            WHERE project_id = $1 AND user_id = $2 AND used_at IS NULL
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_before(&self, cutoff_unix: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM single_use_tokens WHERE expires_at < $1")
            .bind(cutoff_unix)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
