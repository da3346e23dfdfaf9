use async_trait::async_trait;
use auth_service_core::domains::project::domain::{
    model::{Project, RateLimitRule},
    repository::{ProjectRepository, RateLimitRuleRepository},
};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of ProjectRepository
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project, AppError> {
        let created = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                id, name, description, environment, signing_secret, signing_algorithm,
                access_token_ttl_seconds, refresh_token_ttl_seconds, enabled,
                user_table_name, site_url, redirect_allowlist, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.environment)
        .bind(&project.signing_secret)
        .bind(&project.signing_algorithm)
        .bind(project.access_token_ttl_seconds)
        .bind(project.refresh_token_ttl_seconds)
        .bind(project.enabled)
        .bind(&project.user_table_name)
        .bind(&project.site_url)
        .bind(&project.redirect_allowlist)
        .bind(project.created_at)
        .bind(project.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    async fn find_by_name_and_environment(
        &self,
        name: &str,
        environment: &str,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE name = $1 AND environment = $2",
        )
        .bind(name)
        .bind(environment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>, AppError> {
        let projects =
            sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(projects)
    }

    async fn update(&self, project: &Project) -> Result<Project, AppError> {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET description = $2,
                access_token_ttl_seconds = $3,
                refresh_token_ttl_seconds = $4,
                enabled = $5,
                site_url = $6,
                redirect_allowlist = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&project.id)
        .bind(&project.description)
        .bind(project.access_token_ttl_seconds)
        .bind(project.refresh_token_ttl_seconds)
        .bind(project.enabled)
        .bind(&project.site_url)
        .bind(&project.redirect_allowlist)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn set_user_table_name(&self, id: &str, table_name: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE projects SET user_table_name = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(table_name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_signing_secret(&self, id: &str, secret: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE projects SET signing_secret = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(secret)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of RateLimitRuleRepository
#[derive(Clone)]
pub struct PgRateLimitRuleRepository {
    pool: PgPool,
}

impl PgRateLimitRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRuleRepository for PgRateLimitRuleRepository {
    async fn insert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError> {
        let created = sqlx::query_as::<_, RateLimitRule>(
            r#"
            INSERT INTO rate_limit_rules (
                id, project_id, rule_type, window_seconds, max_attempts,
                action, block_duration_seconds, enabled, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(rule.id)
        .bind(&rule.project_id)
        .bind(&rule.rule_type)
        .bind(rule.window_seconds)
        .bind(rule.max_attempts)
        .bind(&rule.action)
        .bind(rule.block_duration_seconds)
        .bind(rule.enabled)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list(&self, project_id: &str) -> Result<Vec<RateLimitRule>, AppError> {
        let rules = sqlx::query_as::<_, RateLimitRule>(
            "SELECT * FROM rate_limit_rules WHERE project_id = $1 ORDER BY rule_type",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn list_enabled(&self, project_id: &str) -> Result<Vec<RateLimitRule>, AppError> {
        let rules = sqlx::query_as::<_, RateLimitRule>(
            "SELECT * FROM rate_limit_rules WHERE project_id = $1 AND enabled = TRUE",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    async fn find(
        &self,
        project_id: &str,
        rule_type: &str,
    ) -> Result<Option<RateLimitRule>, AppError> {
        let rule = sqlx::query_as::<_, RateLimitRule>(
            "SELECT * FROM rate_limit_rules WHERE project_id = $1 AND rule_type = $2",
        )
        .bind(project_id)
        .bind(rule_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    async fn upsert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError> {
        let upserted = sqlx::query_as::<_, RateLimitRule>(
            r#"
            INSERT INTO rate_limit_rules (
                id, project_id, rule_type, window_seconds, max_attempts,
                action, block_duration_seconds, enabled, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (project_id, rule_type) DO UPDATE
            SET window_seconds = EXCLUDED.window_seconds,
                max_attempts = EXCLUDED.max_attempts,
                action = EXCLUDED.action,
                block_duration_seconds = EXCLUDED.block_duration_seconds,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(rule.id)
        .bind(&rule.project_id)
        .bind(&rule.rule_type)
        .bind(rule.window_seconds)
        .bind(rule.max_attempts)
        .bind(&rule.action)
        .bind(rule.block_duration_seconds)
        .bind(rule.enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(upserted)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM rate_limit_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
