use async_trait::async_trait;
use shared_error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use auth_service_core::domains::audit::domain::{model::AuditEvent, repository::AuditLogRepository};
use auth_service_core::domains::auth::{
    domain::{
        model::{AuthAttempt, SingleUseToken, RESET_TOKEN_TTL_SECONDS},
        rate_limiter::RateLimiter,
        repository::{RefreshTokenRepository, SingleUseTokenRepository, UserRepository},
        service::PasswordResetService,
    },
    dto::auth_dto::{mask_email, ForgotPasswordResp, RequestMeta},
    utils::password_policy::validate_user_password,
};
use auth_service_core::domains::email::domain::service::EmailService;
use auth_service_core::domains::project::domain::{model::Project, repository::ProjectRepository};

use super::password::hash_password;
use super::token::{generate_token, hash_token, SINGLE_USE_TOKEN_LEN};

/// Retention window for expired tokens before cleanup removes them
const TOKEN_RETENTION_SECONDS: i64 = 86_400;

/// Password reset service implementation
///
/// The forgot-password surface never discloses whether an email maps to an
/// account: every path short-circuits to the same success response.
pub struct PasswordResetServiceImpl<PR, UR, ST, RT>
where
    PR: ProjectRepository,
    UR: UserRepository,
    ST: SingleUseTokenRepository,
    RT: RefreshTokenRepository,
{
    project_repo: Arc<PR>,
    user_repo: Arc<UR>,
    token_repo: Arc<ST>,
    refresh_repo: Arc<RT>,
    rate_limiter: Arc<dyn RateLimiter>,
    audit_log: Arc<dyn AuditLogRepository>,
    email_service: Option<Arc<dyn EmailService>>,
}

impl<PR, UR, ST, RT> PasswordResetServiceImpl<PR, UR, ST, RT>
where
    PR: ProjectRepository,
    UR: UserRepository,
    ST: SingleUseTokenRepository,
    RT: RefreshTokenRepository,
{
    pub fn new(
        project_repo: Arc<PR>,
        user_repo: Arc<UR>,
        token_repo: Arc<ST>,
        refresh_repo: Arc<RT>,
        rate_limiter: Arc<dyn RateLimiter>,
        audit_log: Arc<dyn AuditLogRepository>,
        email_service: Option<Arc<dyn EmailService>>,
    ) -> Self {
        Self {
            project_repo,
            user_repo,
            token_repo,
            refresh_repo,
            rate_limiter,
            audit_log,
            email_service,
        }
    }

    fn success_response(email: &str) -> ForgotPasswordResp {
        ForgotPasswordResp {
            message: "If an account exists with this email, a password reset link has been sent."
                .to_string(),
            email_masked: mask_email(email),
        }
    }

    fn build_reset_url(project: &Project, token: &str) -> Option<String> {
        project
            .site_url
            .as_ref()
            .map(|base| format!("{}/reset-password?token={}", base.trim_end_matches('/'), token))
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.log(event).await {
            tracing::warn!(error = %e, "Audit write failed");
        }
    }

    async fn send_reset_email(&self, project: &Project, email: &str, token: &str) {
        let Some(email_service) = &self.email_service else {
            tracing::info!(email = %email, "Password reset link issued (mailer not configured)");
            return;
        };

        let mut values = HashMap::new();
        values.insert("email".to_string(), email.to_string());
        values.insert("project_name".to_string(), project.name.clone());
        if let Some(url) = Self::build_reset_url(project, token) {
            values.insert("reset_url".to_string(), url);
        }

        if let Err(e) = email_service
            .send_templated(project, "password_reset", email, &values)
            .await
        {
            tracing::warn!(email = %email, error = %e, "Password reset email failed");
            self.audit(AuditEvent::warning(Some(&project.id), "password_reset_email_failed"))
                .await;
        }
    }
}

#[async_trait]
impl<PR, UR, ST, RT> PasswordResetService for PasswordResetServiceImpl<PR, UR, ST, RT>
where
    PR: ProjectRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    ST: SingleUseTokenRepository + Send + Sync,
    RT: RefreshTokenRepository + Send + Sync,
{
    async fn request_reset(
        &self,
        project_id: &str,
        email: &str,
        meta: RequestMeta,
    ) -> Result<ForgotPasswordResp, AppError> {
        let response = Self::success_response(email);

        // A tripped rate limit is not disclosed either; the request is
        // dropped behind the same success response
        if let Err(e) = self
            .rate_limiter
            .check(project_id, meta.ip_address.as_deref(), Some(email))
            .await
        {
            tracing::warn!(project_id = %project_id, error = %e, "Password reset rate limited");
            if let Err(e) = self
                .rate_limiter
                .record(&AuthAttempt::failure(
                    project_id,
                    "password_reset",
                    Some(email.to_string()),
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    "Rate limited",
                ))
                .await
            {
                tracing::error!(error = %e, "Failed to record auth attempt");
            }
            return Ok(response);
        }

        let Some(project) = self.project_repo.find_by_id(project_id).await? else {
            return Ok(response);
        };
        if !project.enabled {
            return Ok(response);
        }

        let Some(user) = self
            .user_repo
            .find_by_email(&project.user_table_name, email)
            .await?
        else {
            tracing::debug!(project_id = %project_id, "Password reset for unknown email");
            return Ok(response);
        };

        if user.password_hash.is_none() && user.oauth_provider.is_some() {
            tracing::debug!(user_id = %user.id, "Password reset for OAuth-only user");
            return Ok(response);
        }

        // Outstanding tokens die with every new request
        self.token_repo
            .mark_all_used_for_user(project_id, user.id)
            .await?;

        let plaintext = generate_token(SINGLE_USE_TOKEN_LEN);
        let token = SingleUseToken::new(
            project_id,
            user.id,
            email,
            hash_token(&plaintext),
            RESET_TOKEN_TTL_SECONDS,
        );
        self.token_repo.create(&token).await?;

        self.send_reset_email(&project, email, &plaintext).await;

        if let Err(e) = self
            .rate_limiter
            .record(&AuthAttempt::success(
                project_id,
                "password_reset",
                Some(email.to_string()),
                meta.ip_address.clone(),
                meta.user_agent.clone(),
                Some(user.id),
            ))
            .await
        {
            tracing::error!(error = %e, "Failed to record auth attempt");
        }
        self.audit(
            AuditEvent::success(Some(project_id), "password_reset_requested")
                .with_user(user.id)
                .with_request_context(meta.ip_address, meta.user_agent),
        )
        .await;

        Ok(response)
    }

    async fn reset_password(
        &self,
        project_id: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        validate_user_password(new_password).map_err(AppError::Validation)?;

        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        if !project.enabled {
            return Err(AppError::AuthFailure("Project is disabled".to_string()));
        }

        let row = self
            .token_repo
            .find_by_hash(project_id, &hash_token(token))
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid or expired reset token".to_string()))?;

        if !row.is_valid() {
            return Err(AppError::AuthFailure("Invalid or expired reset token".to_string()));
        }

        let user = self
            .user_repo
            .find_by_id(&project.user_table_name, row.user_id)
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid or expired reset token".to_string()))?;

        let password_hash = hash_password(new_password).await?;

        // Password write goes first: a crash between the two statements
        // leaves the token unused and the retry converges on the same state
        self.user_repo
            .update_password(&project.user_table_name, user.id, &password_hash)
            .await?;

        if !self.token_repo.mark_used(row.id).await? {
            // Lost a race with a concurrent consumption of the same token
            return Err(AppError::AuthFailure("Invalid or expired reset token".to_string()));
        }

        // Outstanding sessions die with the old password
        let revoked = self
            .refresh_repo
            .revoke_all_for_user(project_id, user.id, "password_reset")
            .await?;

        tracing::info!(
            project_id = %project_id,
            user_id = %user.id,
            sessions_revoked = %revoked,
            "Password reset completed"
        );
        self.audit(
            AuditEvent::success(Some(project_id), "password_reset_completed").with_user(user.id),
        )
        .await;

        Ok(())
    }

    async fn revoke_user_tokens(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        self.token_repo
            .mark_all_used_for_user(project_id, user_id)
            .await
    }

    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let cutoff = chrono::Utc::now().timestamp() - TOKEN_RETENTION_SECONDS;
        let deleted = self.token_repo.delete_expired_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted = %deleted, "Expired single-use tokens removed");
        }
        Ok(deleted)
    }
}
