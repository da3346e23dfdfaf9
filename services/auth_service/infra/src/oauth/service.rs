use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use shared_error::AppError;
use shared_jwt::{encode_jwt, Claims};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;
use validator::Validate;

use auth_service_core::domains::audit::domain::{model::AuditEvent, repository::AuditLogRepository};
use auth_service_core::domains::auth::{
    domain::{
        model::{AuthAttempt, RefreshToken, User},
        rate_limiter::RateLimiter,
        repository::{RefreshTokenRepository, UserRepository},
    },
    dto::auth_dto::{AuthResp, RequestMeta},
};
use auth_service_core::domains::oauth::{
    domain::{
        model::{OAuthIdentity, OAuthProviderConfig},
        repository::OAuthProviderRepository,
        service::OAuthService,
    },
    dto::oauth_dto::{AuthorizeUrlResp, OAuthProviderReq, OAuthProviderResp},
};
use auth_service_core::domains::project::domain::{model::Project, repository::ProjectRepository};

use super::secret_box::SecretBox;
use crate::auth::token::{generate_token, hash_token, REFRESH_TOKEN_LEN};

#[derive(Debug, Deserialize)]
struct TokenExchangeResp {
    access_token: String,
}

/// OAuth engine for the authorization-code grant
pub struct OAuthServiceImpl<CR, PR, UR, RT>
where
    CR: OAuthProviderRepository,
    PR: ProjectRepository,
    UR: UserRepository,
    RT: RefreshTokenRepository,
{
    config_repo: Arc<CR>,
    project_repo: Arc<PR>,
    user_repo: Arc<UR>,
    refresh_repo: Arc<RT>,
    rate_limiter: Arc<dyn RateLimiter>,
    audit_log: Arc<dyn AuditLogRepository>,
    secret_box: SecretBox,
    http: reqwest::Client,
}

impl<CR, PR, UR, RT> OAuthServiceImpl<CR, PR, UR, RT>
where
    CR: OAuthProviderRepository,
    PR: ProjectRepository,
    UR: UserRepository,
    RT: RefreshTokenRepository,
{
    pub fn new(
        config_repo: Arc<CR>,
        project_repo: Arc<PR>,
        user_repo: Arc<UR>,
        refresh_repo: Arc<RT>,
        rate_limiter: Arc<dyn RateLimiter>,
        audit_log: Arc<dyn AuditLogRepository>,
        secret_box: SecretBox,
        outbound_timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(outbound_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config_repo,
            project_repo,
            user_repo,
            refresh_repo,
            rate_limiter,
            audit_log,
            secret_box,
            http,
        })
    }

    async fn load_enabled_project(&self, project_id: &str) -> Result<Project, AppError> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        if !project.enabled {
            return Err(AppError::AuthFailure("Project is disabled".to_string()));
        }
        Ok(project)
    }

    async fn load_provider(
        &self,
        project_id: &str,
        provider_name: &str,
    ) -> Result<OAuthProviderConfig, AppError> {
        let config = self
            .config_repo
            .find(project_id, provider_name)
            .await?
            .ok_or_else(|| AppError::NotFound("OAuth provider not configured".to_string()))?;
        if !config.enabled {
            return Err(AppError::NotFound("OAuth provider not configured".to_string()));
        }
        Ok(config)
    }

    fn check_redirect_allowed(project: &Project, redirect_uri: &str) -> Result<(), AppError> {
        let allowlist = &project.redirect_allowlist.0;
        if allowlist.is_empty() {
            return Ok(());
        }
        if !allowlist.iter().any(|allowed| allowed == redirect_uri) {
            return Err(AppError::BadRequest("Redirect URI not allowed".to_string()));
        }
        Ok(())
    }

    async fn exchange_code(
        &self,
        config: &OAuthProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, AppError> {
        let client_secret = self.secret_box.open(&config.client_secret)?;

        let params = [
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(provider = %config.provider_name, error = %e, "Token exchange failed");
                AppError::BadRequest("OAuth token exchange failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                provider = %config.provider_name,
                status = %response.status(),
                "Token exchange returned non-success status"
            );
            return Err(AppError::BadRequest("OAuth token exchange failed".to_string()));
        }

        let exchanged: TokenExchangeResp = response
            .json()
            .await
            .map_err(|_| AppError::BadRequest("OAuth token exchange failed".to_string()))?;

        Ok(exchanged.access_token)
    }

    async fn fetch_identity(
        &self,
        config: &OAuthProviderConfig,
        provider_access_token: &str,
    ) -> Result<OAuthIdentity, AppError> {
        let response = self
            .http
            .get(&config.userinfo_url)
            .bearer_auth(provider_access_token)
            .header("Accept", "application/json")
            .header("User-Agent", "auth-service")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(provider = %config.provider_name, error = %e, "Userinfo fetch failed");
                AppError::BadRequest("OAuth userinfo request failed".to_string())
            })?;

        if !response.status().is_success() {
            return Err(AppError::BadRequest("OAuth userinfo request failed".to_string()));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|_| AppError::BadRequest("OAuth userinfo request failed".to_string()))?;

        OAuthIdentity::from_userinfo(raw).ok_or_else(|| {
            AppError::BadRequest("Email could not be extracted from provider response".to_string())
        })
    }

    /// Resolve the provider identity to a user: existing OAuth user, email
    /// conflict, or a fresh passwordless row
    async fn resolve_user(
        &self,
        project: &Project,
        provider_name: &str,
        identity: &OAuthIdentity,
    ) -> Result<(User, bool), AppError> {
        if let Some(user) = self
            .user_repo
            .find_by_oauth_identity(
                &project.user_table_name,
                provider_name,
                &identity.provider_user_id,
            )
            .await?
        {
            return Ok((user, false));
        }

        if self
            .user_repo
            .find_by_email(&project.user_table_name, &identity.email)
            .await?
            .is_some()
        {
            // Account linking is not supported; password and OAuth
            // identities stay separate
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email: identity.email.clone(),
            email_verified: true,
            phone: None,
            phone_verified: false,
            password_hash: None,
            oauth_provider: Some(provider_name.to_string()),
            oauth_provider_user_id: Some(identity.provider_user_id.clone()),
            oauth_raw_user_data: Some(sqlx::types::Json(identity.raw.clone())),
            display_name: identity.display_name.clone(),
            avatar_url: None,
            metadata: None,
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        let created = self.user_repo.create(&project.user_table_name, &user).await?;
        Ok((created, true))
    }

    fn mint_access_token(&self, project: &Project, user: &User) -> Result<String, AppError> {
        let secret = project.signing_secret_bytes()?;
        let claims = Claims::new_access(
            user.id,
            user.email.clone(),
            project.id.clone(),
            project.access_token_ttl_seconds,
        );
        encode_jwt(&claims, &secret)
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.log(event).await {
            tracing::warn!(error = %e, "Audit write failed");
        }
    }
}

#[async_trait]
impl<CR, PR, UR, RT> OAuthService for OAuthServiceImpl<CR, PR, UR, RT>
where
    CR: OAuthProviderRepository + Send + Sync,
    PR: ProjectRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    RT: RefreshTokenRepository + Send + Sync,
{
    async fn authorization_url(
        &self,
        project_id: &str,
        provider_name: &str,
        redirect_uri: &str,
        state: Option<String>,
    ) -> Result<AuthorizeUrlResp, AppError> {
        let project = self.load_enabled_project(project_id).await?;
        Self::check_redirect_allowed(&project, redirect_uri)?;
        let config = self.load_provider(project_id, provider_name).await?;

        let state = state.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut url = Url::parse(&config.authorization_url)
            .map_err(|_| AppError::Internal("Provider authorization URL is invalid".to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &config.scopes.0.join(" "))
            .append_pair("state", &state);

        Ok(AuthorizeUrlResp {
            authorization_url: url.to_string(),
            state,
        })
    }

    async fn handle_callback(
        &self,
        project_id: &str,
        provider_name: &str,
        code: &str,
        redirect_uri: &str,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError> {
        self.rate_limiter
            .check(project_id, meta.ip_address.as_deref(), None)
            .await?;

        let project = self.load_enabled_project(project_id).await?;
        Self::check_redirect_allowed(&project, redirect_uri)?;
        let config = self.load_provider(project_id, provider_name).await?;

        let outcome: Result<(AuthResp, bool), AppError> = async {
            let provider_token = self.exchange_code(&config, code, redirect_uri).await?;
            let identity = self.fetch_identity(&config, &provider_token).await?;

            let (user, is_new) = self.resolve_user(&project, provider_name, &identity).await?;
            self.user_repo
                .update_last_login(&project.user_table_name, user.id)
                .await?;

            let access_token = self.mint_access_token(&project, &user)?;
            let plaintext = generate_token(REFRESH_TOKEN_LEN);
            let row = RefreshToken::new(
                &project.id,
                user.id,
                hash_token(&plaintext),
                project.refresh_token_ttl_seconds,
                meta.ip_address.clone(),
                meta.user_agent.clone(),
            );
            self.refresh_repo.create(&row).await?;

            Ok((
                AuthResp {
                    access_token,
                    refresh_token: plaintext,
                    token_type: "Bearer".to_string(),
                    expires_in: project.access_token_ttl_seconds,
                    user: (&user).into(),
                },
                is_new,
            ))
        }
        .await;

        match outcome {
            Ok((resp, is_new)) => {
                if let Err(e) = self
                    .rate_limiter
                    .record(&AuthAttempt::success(
                        project_id,
                        "oauth",
                        Some(resp.user.email.clone()),
                        meta.ip_address.clone(),
                        meta.user_agent.clone(),
                        Some(resp.user.id),
                    ))
                    .await
                {
                    tracing::error!(error = %e, "Failed to record auth attempt");
                }
                let event_type = if is_new { "user_created" } else { "oauth_login" };
                self.audit(
                    AuditEvent::success(Some(project_id), event_type)
                        .with_user(resp.user.id)
                        .with_request_context(meta.ip_address, meta.user_agent)
                        .with_data(serde_json::json!({"provider": provider_name})),
                )
                .await;
                Ok(resp)
            },
            Err(e) => {
                if let Err(record_err) = self
                    .rate_limiter
                    .record(&AuthAttempt::failure(
                        project_id,
                        "oauth",
                        None,
                        meta.ip_address.clone(),
                        meta.user_agent.clone(),
                        &e.to_string(),
                    ))
                    .await
                {
                    tracing::error!(error = %record_err, "Failed to record auth attempt");
                }
                Err(e)
            },
        }
    }

    async fn upsert_provider(
        &self,
        project_id: &str,
        req: OAuthProviderReq,
    ) -> Result<OAuthProviderResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        // Disabled projects can still be configured
        self.project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let now = Utc::now();
        let config = OAuthProviderConfig {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            provider_name: req.provider_name,
            client_id: req.client_id,
            client_secret: self.secret_box.seal(&req.client_secret)?,
            authorization_url: req.authorization_url,
            token_url: req.token_url,
            userinfo_url: req.userinfo_url,
            scopes: sqlx::types::Json(req.scopes),
            additional_config: req.additional_config.map(sqlx::types::Json),
            enabled: req.enabled,
            created_at: now,
            updated_at: now,
        };

        let upserted = self.config_repo.upsert(&config).await?;
        Ok(upserted.into())
    }

    async fn list_providers(
        &self,
        project_id: &str,
    ) -> Result<Vec<OAuthProviderResp>, AppError> {
        self.project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let configs = self.config_repo.list(project_id).await?;
        Ok(configs.into_iter().map(Into::into).collect())
    }

    async fn delete_provider(
        &self,
        project_id: &str,
        provider_name: &str,
    ) -> Result<(), AppError> {
        let config = self
            .config_repo
            .find(project_id, provider_name)
            .await?
            .ok_or_else(|| AppError::NotFound("OAuth provider not configured".to_string()))?;

        self.config_repo.delete(config.id).await?;
        Ok(())
    }
}
