use async_trait::async_trait;
use shared_error::AppError;

use crate::domains::project::dto::project_dto::{
    CreateProjectReq, ProjectResp, RateLimitRuleReq, RateLimitRuleResp, UpdateProjectReq,
};

/// Project lifecycle service
///
/// Creation drives the tenant-table manager: validate name, derive the slug,
/// generate the signing secret, insert the row, create the dedicated user
/// table and default rate-limit rules, rolling back the row on any downstream
/// failure.
#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn create_project(&self, req: CreateProjectReq) -> Result<ProjectResp, AppError>;

    async fn get_project(&self, id: &str) -> Result<ProjectResp, AppError>;

    async fn list_projects(&self) -> Result<Vec<ProjectResp>, AppError>;

    async fn update_project(
        &self,
        id: &str,
        req: UpdateProjectReq,
    ) -> Result<ProjectResp, AppError>;

    /// Replace the signing secret with fresh random material; existing access
    /// tokens become unverifiable immediately
    async fn rotate_signing_secret(&self, id: &str) -> Result<ProjectResp, AppError>;

    /// Cascades all tenant data and drops the user table
    async fn delete_project(&self, id: &str) -> Result<(), AppError>;

    async fn list_rate_limit_rules(
        &self,
        project_id: &str,
    ) -> Result<Vec<RateLimitRuleResp>, AppError>;

    async fn upsert_rate_limit_rule(
        &self,
        project_id: &str,
        req: RateLimitRuleReq,
    ) -> Result<RateLimitRuleResp, AppError>;

    async fn delete_rate_limit_rule(
        &self,
        project_id: &str,
        rule_type: &str,
    ) -> Result<(), AppError>;
}
