use async_trait::async_trait;
use auth_service_core::domains::email::domain::{
    model::{EmailProvider, EmailTemplate},
    repository::{EmailProviderRepository, EmailTemplateRepository},
};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of EmailProviderRepository
#[derive(Clone)]
pub struct PgEmailProviderRepository {
    pool: PgPool,
}

impl PgEmailProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailProviderRepository for PgEmailProviderRepository {
    async fn create(&self, provider: &EmailProvider) -> Result<EmailProvider, AppError> {
        let created = sqlx::query_as::<_, EmailProvider>(
            r#"
            INSERT INTO email_providers (
                id, provider_type, config, from_email, from_name,
                is_default, is_fallback, enabled, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(provider.id)
        .bind(&provider.provider_type)
        .bind(&provider.config)
        .bind(&provider.from_email)
        .bind(&provider.from_name)
        .bind(provider.is_default)
        .bind(provider.is_fallback)
        .bind(provider.enabled)
        .bind(provider.created_at)
        .bind(provider.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailProvider>, AppError> {
        let provider =
            sqlx::query_as::<_, EmailProvider>("SELECT * FROM email_providers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(provider)
    }

    async fn find_default(&self) -> Result<Option<EmailProvider>, AppError> {
        let provider = sqlx::query_as::<_, EmailProvider>(
            "SELECT * FROM email_providers \
             WHERE is_default = TRUE AND enabled = TRUE \
             ORDER BY created_at LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }

    async fn find_fallback(&self) -> Result<Option<EmailProvider>, AppError> {
        let provider = sqlx::query_as::<_, EmailProvider>(
            "SELECT * FROM email_providers \
             WHERE is_fallback = TRUE AND enabled = TRUE \
             ORDER BY created_at LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }

    async fn list(&self) -> Result<Vec<EmailProvider>, AppError> {
        let providers =
            sqlx::query_as::<_, EmailProvider>("SELECT * FROM email_providers ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(providers)
    }

    async fn update(&self, provider: &EmailProvider) -> Result<EmailProvider, AppError> {
        let updated = sqlx::query_as::<_, EmailProvider>(
            r#"
            UPDATE email_providers
            SET config = $2, from_email = $3, from_name = $4,
                is_default = $5, is_fallback = $6, enabled = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(provider.id)
        .bind(&provider.config)
        .bind(&provider.from_email)
        .bind(&provider.from_name)
        .bind(provider.is_default)
        .bind(provider.is_fallback)
        .bind(provider.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM email_providers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of EmailTemplateRepository
#[derive(Clone)]
pub struct PgEmailTemplateRepository {
    pool: PgPool,
}

impl PgEmailTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTemplateRepository for PgEmailTemplateRepository {
    async fn find_for_project(
        &self,
        project_id: &str,
        template_type: &str,
    ) -> Result<Option<EmailTemplate>, AppError> {
        // Per-project override first, then the system default
        let template = sqlx::query_as::<_, EmailTemplate>(
            r#"
            SELECT * FROM email_templates
            WHERE template_type = $2 AND (project_id = $1 OR project_id IS NULL)
            ORDER BY project_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(template_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    async fn upsert(&self, template: &EmailTemplate) -> Result<EmailTemplate, AppError> {
        let upserted = sqlx::query_as::<_, EmailTemplate>(
            r#"
            INSERT INTO email_templates (
                id, project_id, template_type, subject, html_body, text_body,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT ((COALESCE(project_id, '')), template_type) DO UPDATE
            SET subject = EXCLUDED.subject,
                html_body = EXCLUDED.html_body,
                text_body = EXCLUDED.text_body,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(template.id)
        .bind(&template.project_id)
        .bind(&template.template_type)
        .bind(&template.subject)
        .bind(&template.html_body)
        .bind(&template.text_body)
        .fetch_one(&self.pool)
        .await?;

        Ok(upserted)
    }

    async fn list_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<EmailTemplate>, AppError> {
        let templates = sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates WHERE project_id = $1 ORDER BY template_type",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    async fn list_system(&self) -> Result<Vec<EmailTemplate>, AppError> {
        let templates = sqlx::query_as::<_, EmailTemplate>(
            "SELECT * FROM email_templates WHERE project_id IS NULL ORDER BY template_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
