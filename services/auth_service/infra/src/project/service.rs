use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use rand::RngCore;
use shared_error::AppError;
use uuid::Uuid;
use validator::Validate;

use auth_service_core::domains::project::{
    domain::{
        model::{Project, RateLimitRule},
        repository::{ProjectRepository, RateLimitRuleRepository},
        service::ProjectService,
        slug::{generate_project_id, user_table_name, validate_project_name},
    },
    dto::project_dto::{
        CreateProjectReq, ProjectResp, RateLimitRuleReq, RateLimitRuleResp, UpdateProjectReq,
    },
};

use super::table_manager::UserTableManager;

/// Project service implementation
///
/// Creation drives the tenant-table manager; any failure after the project
/// row insert deletes the row again so a half-created tenant never survives.
pub struct ProjectServiceImpl<PR, RR>
where
    PR: ProjectRepository,
    RR: RateLimitRuleRepository,
{
    project_repo: PR,
    rule_repo: RR,
    table_manager: UserTableManager,
}

impl<PR, RR> ProjectServiceImpl<PR, RR>
where
    PR: ProjectRepository,
    RR: RateLimitRuleRepository,
{
    pub fn new(project_repo: PR, rule_repo: RR, table_manager: UserTableManager) -> Self {
        Self {
            project_repo,
            rule_repo,
            table_manager,
        }
    }

    /// 32 random bytes, base64-encoded at rest
    fn generate_signing_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    async fn load_project(&self, id: &str) -> Result<Project, AppError> {
        self.project_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    /// Compensating delete for a failed creation pipeline
    async fn rollback_create(&self, project_id: &str) {
        tracing::warn!(project_id = %project_id, "Rolling back failed project creation");
        if let Err(e) = self.project_repo.delete(project_id).await {
            tracing::error!(project_id = %project_id, error = %e, "Project rollback failed");
        }
    }
}

#[async_trait]
impl<PR, RR> ProjectService for ProjectServiceImpl<PR, RR>
where
    PR: ProjectRepository + Send + Sync,
    RR: RateLimitRuleRepository + Send + Sync,
{
    async fn create_project(&self, req: CreateProjectReq) -> Result<ProjectResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_project_name(&req.name).map_err(AppError::Validation)?;

        let id = generate_project_id(&req.name).ok_or_else(|| {
            AppError::Validation(
                "Project name must contain at least one alphanumeric character".to_string(),
            )
        })?;

        if self
            .project_repo
            .find_by_name_and_environment(&req.name, &req.environment)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Project '{}' already exists in {}",
                req.name, req.environment
            )));
        }
        if self.project_repo.find_by_id(&id).await?.is_some() {
            return Err(AppError::Conflict(format!("Project id '{}' already exists", id)));
        }

        let now = Utc::now();
        let project = Project {
            id: id.clone(),
            name: req.name,
            description: req.description,
            environment: req.environment,
            signing_secret: Self::generate_signing_secret(),
            signing_algorithm: "HS256".to_string(),
            access_token_ttl_seconds: req.access_token_ttl_seconds,
            refresh_token_ttl_seconds: req.refresh_token_ttl_seconds,
            enabled: true,
            // Filled in once the table exists
            user_table_name: String::new(),
            site_url: req.site_url,
            redirect_allowlist: sqlx::types::Json(req.redirect_allowlist),
            created_at: now,
            updated_at: now,
        };

        let mut created = self.project_repo.create(&project).await?;

        let table = user_table_name(&id);
        if let Err(e) = self.table_manager.create_user_table(&table).await {
            // A partially-created table must not survive the rollback
            self.table_manager.drop_user_table(&table).await.ok();
            self.rollback_create(&id).await;
            tracing::error!(project_id = %id, error = %e, "User table creation failed");
            return Err(AppError::Internal("Failed to create project user table".to_string()));
        }
        if let Err(e) = self.project_repo.set_user_table_name(&id, &table).await {
            self.table_manager.drop_user_table(&table).await.ok();
            self.rollback_create(&id).await;
            return Err(e);
        }
        created.user_table_name = table;

        for rule in [
            RateLimitRule::default_per_ip(&id),
            RateLimitRule::default_per_email(&id),
        ] {
            if let Err(e) = self.rule_repo.insert(&rule).await {
                self.table_manager
                    .drop_user_table(&created.user_table_name)
                    .await
                    .ok();
                self.rollback_create(&id).await;
                tracing::error!(project_id = %id, error = %e, "Default rule insert failed");
                return Err(AppError::Internal(
                    "Failed to create default rate-limit rules".to_string(),
                ));
            }
        }

        tracing::info!(project_id = %id, environment = %created.environment, "Project created");
        Ok(created.into())
    }

    async fn get_project(&self, id: &str) -> Result<ProjectResp, AppError> {
        Ok(self.load_project(id).await?.into())
    }

    async fn list_projects(&self) -> Result<Vec<ProjectResp>, AppError> {
        let projects = self.project_repo.list().await?;
        Ok(projects.into_iter().map(Into::into).collect())
    }

    async fn update_project(
        &self,
        id: &str,
        req: UpdateProjectReq,
    ) -> Result<ProjectResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut project = self.load_project(id).await?;

        if let Some(description) = req.description {
            project.description = Some(description);
        }
        if let Some(ttl) = req.access_token_ttl_seconds {
            project.access_token_ttl_seconds = ttl;
        }
        if let Some(ttl) = req.refresh_token_ttl_seconds {
            project.refresh_token_ttl_seconds = ttl;
        }
        if let Some(enabled) = req.enabled {
            project.enabled = enabled;
        }
        if let Some(site_url) = req.site_url {
            project.site_url = Some(site_url);
        }
        if let Some(allowlist) = req.redirect_allowlist {
            project.redirect_allowlist = sqlx::types::Json(allowlist);
        }

        let updated = self.project_repo.update(&project).await?;
        Ok(updated.into())
    }

    async fn rotate_signing_secret(&self, id: &str) -> Result<ProjectResp, AppError> {
        let _ = self.load_project(id).await?;
        let secret = Self::generate_signing_secret();
        self.project_repo.update_signing_secret(id, &secret).await?;

        tracing::warn!(project_id = %id, "Signing secret rotated; outstanding access tokens invalidated");
        Ok(self.load_project(id).await?.into())
    }

    async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let project = self.load_project(id).await?;

        // Fixed-table rows cascade off the project row; the dynamic table
        // needs an explicit drop afterwards.
        let deleted = self.project_repo.delete(id).await?;
        if !deleted {
            return Err(AppError::NotFound("Project not found".to_string()));
        }
        self.table_manager
            .drop_user_table(&project.user_table_name)
            .await?;

        tracing::warn!(project_id = %id, "Project deleted with all tenant data");
        Ok(())
    }

    async fn list_rate_limit_rules(
        &self,
        project_id: &str,
    ) -> Result<Vec<RateLimitRuleResp>, AppError> {
        let _ = self.load_project(project_id).await?;
        let rules = self.rule_repo.list(project_id).await?;
        Ok(rules.into_iter().map(Into::into).collect())
    }

    async fn upsert_rate_limit_rule(
        &self,
        project_id: &str,
        req: RateLimitRuleReq,
    ) -> Result<RateLimitRuleResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let _ = self.load_project(project_id).await?;

        let now = Utc::now();
        let rule = RateLimitRule {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            rule_type: req.rule_type,
            window_seconds: req.window_seconds,
            max_attempts: req.max_attempts,
            action: req.action,
            block_duration_seconds: req.block_duration_seconds,
            enabled: req.enabled,
            created_at: now,
            updated_at: now,
        };

        let upserted = self.rule_repo.upsert(&rule).await?;
        Ok(upserted.into())
    }

    async fn delete_rate_limit_rule(
        &self,
        project_id: &str,
        rule_type: &str,
    ) -> Result<(), AppError> {
        let rule = self
            .rule_repo
            .find(project_id, rule_type)
            .await?
            .ok_or_else(|| AppError::NotFound("Rate-limit rule not found".to_string()))?;

        self.rule_repo.delete(rule.id).await?;
        Ok(())
    }
}
