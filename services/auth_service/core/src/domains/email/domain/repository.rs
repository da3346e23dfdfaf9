use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use super::model::{EmailProvider, EmailTemplate};

/// Email provider registry
#[async_trait]
pub trait EmailProviderRepository: Send + Sync {
    async fn create(&self, provider: &EmailProvider) -> Result<EmailProvider, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EmailProvider>, AppError>;

    async fn find_default(&self) -> Result<Option<EmailProvider>, AppError>;

    async fn find_fallback(&self) -> Result<Option<EmailProvider>, AppError>;

    async fn list(&self) -> Result<Vec<EmailProvider>, AppError>;

    async fn update(&self, provider: &EmailProvider) -> Result<EmailProvider, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Email template store with per-project overrides
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// Lookup order: per-project row, then the system default
    /// (project_id NULL)
    async fn find_for_project(
        &self,
        project_id: &str,
        template_type: &str,
    ) -> Result<Option<EmailTemplate>, AppError>;

    async fn upsert(&self, template: &EmailTemplate) -> Result<EmailTemplate, AppError>;

    async fn list_for_project(&self, project_id: &str)
        -> Result<Vec<EmailTemplate>, AppError>;

    async fn list_system(&self) -> Result<Vec<EmailTemplate>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
