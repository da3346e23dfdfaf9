use async_trait::async_trait;
use auth_service_core::domains::oauth::domain::{
    model::OAuthProviderConfig, repository::OAuthProviderRepository,
};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of OAuthProviderRepository
#[derive(Clone)]
pub struct PgOAuthProviderRepository {
    pool: PgPool,
}

impl PgOAuthProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OAuthProviderRepository for PgOAuthProviderRepository {
    async fn upsert(
        &self,
        config: &OAuthProviderConfig,
    ) -> Result<OAuthProviderConfig, AppError> {
        let upserted = sqlx::query_as::<_, OAuthProviderConfig>(
            r#"
            INSERT INTO oauth_provider_configs (
                id, project_id, provider_name, client_id, client_secret,
                authorization_url, token_url, userinfo_url, scopes,
                additional_config, enabled, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            ON CONFLICT (project_id, provider_name) DO UPDATE
            SET client_id = EXCLUDED.client_id,
                client_secret = EXCLUDED.client_secret,
                authorization_url = EXCLUDED.authorization_url,
                token_url = EXCLUDED.token_url,
                userinfo_url = EXCLUDED.userinfo_url,
                scopes = EXCLUDED.scopes,
                additional_config = EXCLUDED.additional_config,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(config.id)
        .bind(&config.project_id)
        .bind(&config.provider_name)
        .bind(&config.client_id)
        .bind(&config.client_secret)
        .bind(&config.authorization_url)
        .bind(&config.token_url)
        .bind(&config.userinfo_url)
        .bind(&config.scopes)
        .bind(&config.additional_config)
        .bind(config.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(upserted)
    }

    async fn find(
        &self,
        project_id: &str,
        provider_name: &str,
    ) -> Result<Option<OAuthProviderConfig>, AppError> {
        let config = sqlx::query_as::<_, OAuthProviderConfig>(
            "SELECT * FROM oauth_provider_configs \
             WHERE project_id = $1 AND provider_name = $2",
        )
        .bind(project_id)
        .bind(provider_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    async fn list(&self, project_id: &str) -> Result<Vec<OAuthProviderConfig>, AppError> {
        let configs = sqlx::query_as::<_, OAuthProviderConfig>(
            "SELECT * FROM oauth_provider_configs WHERE project_id = $1 ORDER BY provider_name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(configs)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM oauth_provider_configs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
