use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use super::model::{Project, RateLimitRule};

/// Project repository
///
/// Owns the fixed `projects` table. The dynamic per-project user table is
/// managed separately by the tenant-table manager in infra.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<Project, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, AppError>;

    /// Uniqueness probe for the (name, environment) invariant
    async fn find_by_name_and_environment(
        &self,
        name: &str,
        environment: &str,
    ) -> Result<Option<Project>, AppError>;

    async fn list(&self) -> Result<Vec<Project>, AppError>;

    async fn update(&self, project: &Project) -> Result<Project, AppError>;

    /// Set the user table name after the table has been created
    async fn set_user_table_name(&self, id: &str, table_name: &str) -> Result<(), AppError>;

    async fn update_signing_secret(&self, id: &str, secret: &str) -> Result<(), AppError>;

    /// Delete the project row; tenant-owned rows in fixed tables cascade
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Rate-limit rule repository
#[async_trait]
pub trait RateLimitRuleRepository: Send + Sync {
    async fn insert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError>;

    async fn list(&self, project_id: &str) -> Result<Vec<RateLimitRule>, AppError>;

    async fn list_enabled(&self, project_id: &str) -> Result<Vec<RateLimitRule>, AppError>;

    async fn find(
        &self,
        project_id: &str,
        rule_type: &str,
    ) -> Result<Option<RateLimitRule>, AppError>;

    /// Insert or replace the rule for (project_id, rule_type)
    async fn upsert(&self, rule: &RateLimitRule) -> Result<RateLimitRule, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
