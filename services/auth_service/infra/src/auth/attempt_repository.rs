use async_trait::async_trait;
use auth_service_core::domains::auth::domain::{
    model::AuthAttempt, repository::AuthAttemptRepository,
};
use shared_error::AppError;
use sqlx::PgPool;

/// PostgreSQL implementation of AuthAttemptRepository
///
/// Append-only; the rate limiter reads sliding-window counts and old rows
/// age out of the window implicitly.
#[derive(Clone)]
pub struct PgAuthAttemptRepository {
    pool: PgPool,
}

impl PgAuthAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthAttemptRepository for PgAuthAttemptRepository {
    async fn record(&self, attempt: &AuthAttempt) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO auth_attempts (
                id, project_id, attempt_type, email, ip_address, user_agent,
                success, failure_reason, user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(attempt.id)
        .bind(&attempt.project_id)
        .bind(&attempt.attempt_type)
        .bind(&attempt.email)
        .bind(&attempt.ip_address)
        .bind(&attempt.user_agent)
        .bind(attempt.success)
        .bind(&attempt.failure_reason)
        .bind(attempt.user_id)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_recent_failures(
        &self,
        project_id: &str,
        window_seconds: i64,
        ip_address: Option<&str>,
        email: Option<&str>,
    ) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM auth_attempts
            WHERE project_id = $1
              AND success = FALSE
              AND created_at > NOW() - ($2 * INTERVAL '1 second')
              AND ($3::TEXT IS NULL OR ip_address = $3)
              AND ($4::TEXT IS NULL OR email = $4)
            "#,
        )
        .bind(project_id)
        .bind(window_seconds)
        .bind(ip_address)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
