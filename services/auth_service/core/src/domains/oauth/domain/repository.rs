use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use super::model::OAuthProviderConfig;

/// OAuth provider configuration repository
#[async_trait]
pub trait OAuthProviderRepository: Send + Sync {
    async fn upsert(
        &self,
        config: &OAuthProviderConfig,
    ) -> Result<OAuthProviderConfig, AppError>;

    async fn find(
        &self,
        project_id: &str,
        provider_name: &str,
    ) -> Result<Option<OAuthProviderConfig>, AppError>;

    async fn list(&self, project_id: &str) -> Result<Vec<OAuthProviderConfig>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
