use async_trait::async_trait;
use auth_service_core::domains::auth::domain::{model::User, repository::UserRepository};
use auth_service_core::domains::project::domain::slug::sanitize_identifier;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of UserRepository over dynamic per-project
/// user tables
///
/// The table name arrives from the project row; it is re-sanitized here
/// before every interpolation regardless of its origin.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table(user_table: &str) -> Result<String, AppError> {
        let table = sanitize_identifier(user_table);
        if table.is_empty() {
            return Err(AppError::Internal("Project user table name is empty".to_string()));
        }
        Ok(table)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(
        &self,
        user_table: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let table = Self::table(user_table)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM {table} WHERE email = $1 AND status <> 'deleted'"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email_any_status(
        &self,
        user_table: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let table = Self::table(user_table)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM {table} WHERE email = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, user_table: &str, id: Uuid) -> Result<Option<User>, AppError> {
        let table = Self::table(user_table)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM {table} WHERE id = $1 AND status <> 'deleted'"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_oauth_identity(
        &self,
        user_table: &str,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, AppError> {
        let table = Self::table(user_table)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM {table} \
             WHERE oauth_provider = $1 AND oauth_provider_user_id = $2 \
               AND status <> 'deleted'"
        ))
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user_table: &str, user: &User) -> Result<User, AppError> {
        let table = Self::table(user_table)?;
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO {table} (
                id, email, email_verified, phone, phone_verified, password_hash,
                oauth_provider, oauth_provider_user_id, oauth_raw_user_data,
                display_name, avatar_url, metadata, status,
                created_at, updated_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(&user.phone)
        .bind(user.phone_verified)
        .bind(&user.password_hash)
        .bind(&user.oauth_provider)
        .bind(&user.oauth_provider_user_id)
        .bind(&user.oauth_raw_user_data)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.metadata)
        .bind(&user.status)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, user_table: &str, user: &User) -> Result<User, AppError> {
        let table = Self::table(user_table)?;
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE {table}
            SET email = $2,
                email_verified = $3,
                phone = $4,
                phone_verified = $5,
                password_hash = $6,
                oauth_provider = $7,
                oauth_provider_user_id = $8,
                oauth_raw_user_data = $9,
                display_name = $10,
                avatar_url = $11,
                metadata = $12,
                status = $13,
                last_login_at = $14
            WHERE id = $1
            RETURNING *
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(&user.phone)
        .bind(user.phone_verified)
        .bind(&user.password_hash)
        .bind(&user.oauth_provider)
        .bind(&user.oauth_provider_user_id)
        .bind(&user.oauth_raw_user_data)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.metadata)
        .bind(&user.status)
        .bind(user.last_login_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn update_password(
        &self,
        user_table: &str,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let table = Self::table(user_table)?;
        let result =
            sqlx::query(&format!("UPDATE {table} SET password_hash = $2 WHERE id = $1"))
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn update_last_login(&self, user_table: &str, id: Uuid) -> Result<(), AppError> {
        let table = Self::table(user_table)?;
        sqlx::query(&format!("UPDATE {table} SET last_login_at = NOW() WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_email_verified(&self, user_table: &str, id: Uuid) -> Result<(), AppError> {
        let table = Self::table(user_table)?;
        let result =
            sqlx::query(&format!("UPDATE {table} SET email_verified = TRUE WHERE id = $1"))
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn set_status(
        &self,
        user_table: &str,
        id: Uuid,
        status: &str,
    ) -> Result<(), AppError> {
        let table = Self::table(user_table)?;
        let result = sqlx::query(&format!("UPDATE {table} SET status = $2 WHERE id = $1"))
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn list(
        &self,
        user_table: &str,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<User>, i64), AppError> {
        let table = Self::table(user_table)?;
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM {table} WHERE status <> 'deleted' \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {table} WHERE status <> 'deleted'"
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total.0))
    }
}
