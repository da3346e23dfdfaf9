use async_trait::async_trait;
use shared_error::AppError;

use crate::domains::auth::dto::auth_dto::{AuthResp, RequestMeta};
use crate::domains::oauth::dto::oauth_dto::{
    AuthorizeUrlResp, OAuthProviderReq, OAuthProviderResp,
};

/// OAuth engine for the authorization-code grant
#[async_trait]
pub trait OAuthService: Send + Sync {
    /// Build the provider's authorization URL; a random state is generated
    /// and returned when the caller supplies none
    async fn authorization_url(
        &self,
        project_id: &str,
        provider_name: &str,
        redirect_uri: &str,
        state: Option<String>,
    ) -> Result<AuthorizeUrlResp, AppError>;

    /// Exchange the authorization code, fetch the user info, resolve or
    /// create the user, and mint a token pair
    async fn handle_callback(
        &self,
        project_id: &str,
        provider_name: &str,
        code: &str,
        redirect_uri: &str,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError>;

    // Admin configuration surface

    async fn upsert_provider(
        &self,
        project_id: &str,
        req: OAuthProviderReq,
    ) -> Result<OAuthProviderResp, AppError>;

    async fn list_providers(
        &self,
        project_id: &str,
    ) -> Result<Vec<OAuthProviderResp>, AppError>;

    async fn delete_provider(
        &self,
        project_id: &str,
        provider_name: &str,
    ) -> Result<(), AppError>;
}
