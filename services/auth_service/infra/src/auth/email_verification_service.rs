use async_trait::async_trait;
use shared_error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use auth_service_core::domains::audit::domain::{model::AuditEvent, repository::AuditLogRepository};
use auth_service_core::domains::auth::{
    domain::{
        model::{SingleUseToken, CONFIRM_TOKEN_TTL_SECONDS},
        repository::{SingleUseTokenRepository, UserRepository},
        service::EmailVerificationService,
    },
    dto::auth_dto::UserInfo,
};
use auth_service_core::domains::email::domain::service::EmailService;
use auth_service_core::domains::project::domain::{model::Project, repository::ProjectRepository};

use super::token::{generate_token, hash_token, SINGLE_USE_TOKEN_LEN};

const TOKEN_RETENTION_SECONDS: i64 = 86_400;

/// Email confirmation service
///
/// Same token machinery as password reset (shared storage table, 24-hour
/// TTL); consuming a token flips the user's `email_verified` flag.
pub struct EmailVerificationServiceImpl<PR, UR, ST>
where
    PR: ProjectRepository,
    UR: UserRepository,
    ST: SingleUseTokenRepository,
{
    project_repo: Arc<PR>,
    user_repo: Arc<UR>,
    token_repo: Arc<ST>,
    audit_log: Arc<dyn AuditLogRepository>,
    email_service: Option<Arc<dyn EmailService>>,
}

impl<PR, UR, ST> EmailVerificationServiceImpl<PR, UR, ST>
where
    PR: ProjectRepository,
    UR: UserRepository,
    ST: SingleUseTokenRepository,
{
    pub fn new(
        project_repo: Arc<PR>,
        user_repo: Arc<UR>,
        token_repo: Arc<ST>,
        audit_log: Arc<dyn AuditLogRepository>,
        email_service: Option<Arc<dyn EmailService>>,
    ) -> Self {
        Self {
            project_repo,
            user_repo,
            token_repo,
            audit_log,
            email_service,
        }
    }

    fn build_confirm_url(project: &Project, token: &str) -> Option<String> {
        project
            .site_url
            .as_ref()
            .map(|base| format!("{}/confirm-email?token={}", base.trim_end_matches('/'), token))
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.log(event).await {
            tracing::warn!(error = %e, "Audit write failed");
        }
    }
}

#[async_trait]
impl<PR, UR, ST> EmailVerificationService for EmailVerificationServiceImpl<PR, UR, ST>
where
    PR: ProjectRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    ST: SingleUseTokenRepository + Send + Sync,
{
    async fn send_confirmation(&self, project_id: &str, user_id: Uuid) -> Result<(), AppError> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let user = self
            .user_repo
            .find_by_id(&project.user_table_name, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.email_verified {
            return Ok(());
        }

        let plaintext = generate_token(SINGLE_USE_TOKEN_LEN);
        let token = SingleUseToken::new(
            project_id,
            user.id,
            &user.email,
            hash_token(&plaintext),
            CONFIRM_TOKEN_TTL_SECONDS,
        );
        self.token_repo.create(&token).await?;

        let Some(email_service) = &self.email_service else {
            tracing::info!(email = %user.email, "Confirmation link issued (mailer not configured)");
            return Ok(());
        };

        let mut values = HashMap::new();
        values.insert("email".to_string(), user.email.clone());
        values.insert("project_name".to_string(), project.name.clone());
        if let Some(name) = &user.display_name {
            values.insert("display_name".to_string(), name.clone());
        }
        if let Some(url) = Self::build_confirm_url(&project, &plaintext) {
            values.insert("confirm_url".to_string(), url);
        }

        email_service
            .send_templated(&project, "confirmation", &user.email, &values)
            .await
    }

    async fn confirm_email(&self, project_id: &str, token: &str) -> Result<UserInfo, AppError> {
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
            .ok_or_else(|| {
                AppError::AuthFailure("Invalid or expired confirmation token".to_string())
            })?;

        if !row.is_valid() {
            return Err(AppError::AuthFailure(
                "Invalid or expired confirmation token".to_string(),
            ));
        }

        if !self.token_repo.mark_used(row.id).await? {
            return Err(AppError::AuthFailure(
                "Invalid or expired confirmation token".to_string(),
            ));
        }

        self.user_repo
            .set_email_verified(&project.user_table_name, row.user_id)
            .await?;

        let user = self
            .user_repo
            .find_by_id(&project.user_table_name, row.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.audit(
            AuditEvent::success(Some(project_id), "email_confirmed").with_user(user.id),
        )
        .await;

        Ok((&user).into())
    }

    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError> {
        let cutoff = chrono::Utc::now().timestamp() - TOKEN_RETENTION_SECONDS;
        self.token_repo.delete_expired_before(cutoff).await
    }
}
