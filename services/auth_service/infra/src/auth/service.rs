use async_trait::async_trait;
use chrono::Utc;
use shared_error::AppError;
use shared_jwt::{decode_jwt_for_project, encode_jwt, Claims};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use auth_service_core::domains::audit::domain::{model::AuditEvent, repository::AuditLogRepository};
use auth_service_core::domains::auth::{
    domain::{
        model::{AuthAttempt, RefreshToken, User},
        rate_limiter::RateLimiter,
        repository::{RefreshTokenRepository, UserRepository},
        service::{AuthService, EmailVerificationService},
    },
    dto::auth_dto::{
        AuthResp, LoginReq, RegisterReq, RequestMeta, TokenPairResp, UserInfo, UserListResp,
    },
    utils::password_policy::validate_user_password,
};
use auth_service_core::domains::project::domain::{
    model::Project, repository::ProjectRepository,
};

use super::password::{hash_password, verify_password};
use super::token::{generate_token, hash_token, REFRESH_TOKEN_LEN};

/// Generic error for every credential mismatch; never distinguishes
/// "no such user" from "wrong password"
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Auth engine implementation
pub struct AuthServiceImpl<PR, UR, RT>
where
    PR: ProjectRepository,
    UR: UserRepository,
    RT: RefreshTokenRepository,
{
    project_repo: Arc<PR>,
    user_repo: Arc<UR>,
    refresh_repo: Arc<RT>,
    rate_limiter: Arc<dyn RateLimiter>,
    audit_log: Arc<dyn AuditLogRepository>,
    email_verification: Option<Arc<dyn EmailVerificationService>>,
}

impl<PR, UR, RT> AuthServiceImpl<PR, UR, RT>
where
    PR: ProjectRepository,
    UR: UserRepository,
    RT: RefreshTokenRepository,
{
    pub fn new(
        project_repo: Arc<PR>,
        user_repo: Arc<UR>,
        refresh_repo: Arc<RT>,
        rate_limiter: Arc<dyn RateLimiter>,
        audit_log: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            project_repo,
            user_repo,
            refresh_repo,
            rate_limiter,
            audit_log,
            email_verification: None,
        }
    }

    /// Wire the confirmation-email sender; registration works without one
    pub fn with_email_verification(
        mut self,
        email_verification: Arc<dyn EmailVerificationService>,
    ) -> Self {
        self.email_verification = Some(email_verification);
        self
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

    /// Generate, persist (hash only) and return a refresh token; the
    /// plaintext leaves this function exactly once
    async fn issue_refresh_token(
        &self,
        project: &Project,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<String, AppError> {
        let plaintext = generate_token(REFRESH_TOKEN_LEN);
        let row = RefreshToken::new(
            &project.id,
            user_id,
            hash_token(&plaintext),
            project.refresh_token_ttl_seconds,
            meta.ip_address.clone(),
            meta.user_agent.clone(),
        );
        self.refresh_repo.create(&row).await?;
        Ok(plaintext)
    }

    async fn mint_pair(
        &self,
        project: &Project,
        user: &User,
        meta: &RequestMeta,
    ) -> Result<AuthResp, AppError> {
        let access_token = self.mint_access_token(project, user)?;
        let refresh_token = self.issue_refresh_token(project, user.id, meta).await?;

        Ok(AuthResp {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: project.access_token_ttl_seconds,
            user: user.into(),
        })
    }

    async fn record_attempt(&self, attempt: AuthAttempt) {
        if let Err(e) = self.rate_limiter.record(&attempt).await {
            tracing::error!(error = %e, "Failed to record auth attempt");
        }
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.log(event).await {
            tracing::warn!(error = %e, "Audit write failed");
        }
    }

    async fn register_inner(
        &self,
        project: &Project,
        req: &RegisterReq,
        meta: &RequestMeta,
    ) -> Result<AuthResp, AppError> {
        if !project.enabled {
            return Err(AppError::AuthFailure("Project is disabled".to_string()));
        }
        validate_user_password(&req.password).map_err(AppError::Validation)?;
        let password_hash = hash_password(&req.password).await?;

        let user = match self
            .user_repo
            .find_by_email_any_status(&project.user_table_name, &req.email)
            .await?
        {
            Some(existing) if existing.status != "deleted" => {
                return Err(AppError::Conflict("Email already registered".to_string()));
            },
            Some(tombstone) => {
                // Reactivation: revive the tombstoned row with fresh
                // credentials and verification reset, keeping the id
                let mut revived = tombstone;
                revived.status = "active".to_string();
                revived.password_hash = Some(password_hash);
                revived.email_verified = false;
                revived.display_name = req.display_name.clone();
                revived.oauth_provider = None;
                revived.oauth_provider_user_id = None;
                revived.oauth_raw_user_data = None;
                self.user_repo
                    .update(&project.user_table_name, &revived)
                    .await?
            },
            None => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::now_v7(),
                    email: req.email.clone(),
                    email_verified: false,
                    phone: None,
                    phone_verified: false,
                    password_hash: Some(password_hash),
                    oauth_provider: None,
                    oauth_provider_user_id: None,
                    oauth_raw_user_data: None,
                    display_name: req.display_name.clone(),
                    avatar_url: None,
                    metadata: None,
                    status: "active".to_string(),
                    created_at: now,
                    updated_at: now,
                    last_login_at: None,
                };
                self.user_repo.create(&project.user_table_name, &user).await?
            },
        };

        self.mint_pair(project, &user, meta).await
    }
}

#[async_trait]
impl<PR, UR, RT> AuthService for AuthServiceImpl<PR, UR, RT>
where
    PR: ProjectRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    RT: RefreshTokenRepository + Send + Sync,
{
    async fn register(
        &self,
        project_id: &str,
        req: RegisterReq,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.rate_limiter
            .check(project_id, meta.ip_address.as_deref(), Some(req.email.as_str()))
            .await?;

        // A nonexistent project cannot own attempt rows; everything after
        // this point records its failures
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        match self.register_inner(&project, &req, &meta).await {
            Ok(resp) => {
                let user_id = resp.user.id;
                self.record_attempt(AuthAttempt::success(
                    project_id,
                    "register",
                    Some(req.email.clone()),
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    Some(user_id),
                ))
                .await;
                self.audit(
                    AuditEvent::success(Some(project_id), "user_created")
                        .with_user(user_id)
                        .with_request_context(meta.ip_address.clone(), meta.user_agent.clone()),
                )
                .await;

                // Confirmation email is best-effort; a failure downgrades to
                // a warning audit event, never a failed registration
                if let Some(verification) = &self.email_verification {
                    if let Err(e) = verification.send_confirmation(project_id, user_id).await {
                        tracing::warn!(user_id = %user_id, error = %e, "Confirmation email failed");
                        self.audit(
                            AuditEvent::warning(Some(project_id), "confirmation_email_failed")
                                .with_user(user_id),
                        )
                        .await;
                    }
                }

                Ok(resp)
            },
            Err(e) => {
                self.record_attempt(AuthAttempt::failure(
                    project_id,
                    "register",
                    Some(req.email.clone()),
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    &e.to_string(),
                ))
                .await;
                Err(e)
            },
        }
    }

    async fn login(
        &self,
        project_id: &str,
        req: LoginReq,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.rate_limiter
            .check(project_id, meta.ip_address.as_deref(), Some(req.email.as_str()))
            .await?;

        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let outcome: Result<AuthResp, AppError> = async {
            if !project.enabled {
                return Err(AppError::AuthFailure("Project is disabled".to_string()));
            }
            let user = self
                .user_repo
                .find_by_email(&project.user_table_name, &req.email)
                .await?
                .ok_or_else(|| AppError::AuthFailure(INVALID_CREDENTIALS.to_string()))?;

            let password_hash = user.password_hash.as_ref().ok_or_else(|| {
                AppError::AuthFailure("Password authentication not set up".to_string())
            })?;

            if !verify_password(&req.password, password_hash).await? {
                return Err(AppError::AuthFailure(INVALID_CREDENTIALS.to_string()));
            }
            if !user.is_active() {
                return Err(AppError::AuthFailure(INVALID_CREDENTIALS.to_string()));
            }

            self.user_repo
                .update_last_login(&project.user_table_name, user.id)
                .await?;

            self.mint_pair(&project, &user, &meta).await
        }
        .await;

        match outcome {
            Ok(resp) => {
                self.record_attempt(AuthAttempt::success(
                    project_id,
                    "login",
                    Some(req.email.clone()),
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    Some(resp.user.id),
                ))
                .await;
                Ok(resp)
            },
            Err(e) => {
                self.record_attempt(AuthAttempt::failure(
                    project_id,
                    "login",
                    Some(req.email.clone()),
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    &e.to_string(),
                ))
                .await;
                Err(e)
            },
        }
    }

    async fn verify_access_token(
        &self,
        project_id: &str,
        token: &str,
    ) -> Result<Claims, AppError> {
        let project = self.load_enabled_project(project_id).await?;
        let secret = project.signing_secret_bytes()?;
        decode_jwt_for_project(token, &secret, project_id)
    }

    async fn refresh(
        &self,
        project_id: &str,
        refresh_token: &str,
        meta: RequestMeta,
    ) -> Result<TokenPairResp, AppError> {
        self.rate_limiter
            .check(project_id, meta.ip_address.as_deref(), None)
            .await?;

        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let outcome: Result<TokenPairResp, AppError> = async {
            if !project.enabled {
                return Err(AppError::AuthFailure("Project is disabled".to_string()));
            }
            let presented_hash = hash_token(refresh_token);
            let row = self
                .refresh_repo
                .find_by_hash(project_id, &presented_hash)
                .await?
                .ok_or_else(|| AppError::AuthFailure("Invalid refresh token".to_string()))?;

            if row.revoked {
                // A revoked-but-known token is treated as compromise: every
                // live token of that user is revoked
                let revoked = self
                    .refresh_repo
                    .revoke_all_for_user(project_id, row.user_id, "reuse_detected")
                    .await?;
                tracing::warn!(
                    project_id = %project_id,
                    user_id = %row.user_id,
                    revoked = %revoked,
                    "Refresh token reuse detected"
                );
                self.audit(
                    AuditEvent::warning(Some(project_id), "refresh_reuse_detected")
                        .with_user(row.user_id)
                        .with_request_context(meta.ip_address.clone(), meta.user_agent.clone()),
                )
                .await;
                return Err(AppError::AuthFailure("Invalid refresh token".to_string()));
            }
            if row.is_expired() {
                return Err(AppError::AuthFailure("Refresh token expired".to_string()));
            }

            let user = self
                .user_repo
                .find_by_id(&project.user_table_name, row.user_id)
                .await?
                .filter(User::is_active)
                .ok_or_else(|| AppError::AuthFailure("Invalid refresh token".to_string()))?;

            let plaintext = generate_token(REFRESH_TOKEN_LEN);
            let replacement = RefreshToken::new(
                &project.id,
                user.id,
                hash_token(&plaintext),
                project.refresh_token_ttl_seconds,
                meta.ip_address.clone(),
                meta.user_agent.clone(),
            );
            self.refresh_repo.rotate(row.id, &replacement).await?;

            let access_token = self.mint_access_token(&project, &user)?;
            Ok(TokenPairResp {
                access_token,
                refresh_token: plaintext,
                token_type: "Bearer".to_string(),
                expires_in: project.access_token_ttl_seconds,
            })
        }
        .await;

        match outcome {
            Ok(resp) => {
                self.record_attempt(AuthAttempt::success(
                    project_id,
                    "refresh",
                    None,
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    None,
                ))
                .await;
                Ok(resp)
            },
            Err(e) => {
                self.record_attempt(AuthAttempt::failure(
                    project_id,
                    "refresh",
                    None,
                    meta.ip_address.clone(),
                    meta.user_agent.clone(),
                    &e.to_string(),
                ))
                .await;
                Err(e)
            },
        }
    }

    async fn logout(&self, project_id: &str, refresh_token: &str) -> Result<(), AppError> {
        let presented_hash = hash_token(refresh_token);
        let row = self
            .refresh_repo
            .find_by_hash(project_id, &presented_hash)
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid refresh token".to_string()))?;

        // Access tokens stay valid until exp; clients discard them
        self.refresh_repo.revoke(row.id, "user_logout").await?;
        Ok(())
    }

    async fn revoke_all_user_tokens(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        let revoked = self
            .refresh_repo
            .revoke_all_for_user(project_id, user_id, "revoked_all")
            .await?;

        self.audit(
            AuditEvent::success(Some(project_id), "user_tokens_revoked").with_user(user_id),
        )
        .await;
        Ok(revoked)
    }

    async fn get_user(&self, project_id: &str, user_id: Uuid) -> Result<UserInfo, AppError> {
        let project = self.load_enabled_project(project_id).await?;
        let user = self
            .user_repo
            .find_by_id(&project.user_table_name, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok((&user).into())
    }

    async fn list_users(
        &self,
        project_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<UserListResp, AppError> {
        let project = self
            .project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let (users, total) = self
            .user_repo
            .list(&project.user_table_name, page, page_size)
            .await?;

        Ok(UserListResp {
            users: users.iter().map(Into::into).collect(),
            total,
            page,
            page_size,
        })
    }

    async fn set_user_status(
        &self,
        project_id: &str,
        user_id: Uuid,
        status: &str,
    ) -> Result<UserInfo, AppError> {
        if !auth_service_core::domains::auth::domain::model::USER_STATUSES.contains(&status) {
            return Err(AppError::Validation(format!("Invalid status '{}'", status)));
        }

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

        self.user_repo
            .set_status(&project.user_table_name, user.id, status)
            .await?;

        if status != "active" {
            let revoked = self
                .refresh_repo
                .revoke_all_for_user(project_id, user.id, status)
                .await?;
            tracing::info!(
                project_id = %project_id,
                user_id = %user.id,
                status = %status,
                sessions_revoked = %revoked,
                "User status changed"
            );
        }

        self.audit(
            AuditEvent::success(Some(project_id), "user_status_changed")
                .with_user(user.id)
                .with_data(serde_json::json!({"status": status})),
        )
        .await;

        let mut updated = user;
        updated.status = status.to_string();
        Ok((&updated).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_service_core::domains::audit::domain::repository::NoOpAuditLogRepository;
    use auth_service_core::domains::project::domain::model::RateLimitRule;
    use auth_service_core::domains::project::domain::repository::RateLimitRuleRepository;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // In-memory fakes backing the full engine flows

    struct FakeProjects(Mutex<HashMap<String, Project>>);

    impl FakeProjects {
        fn with_project(project: Project) -> Self {
            let mut map = HashMap::new();
            map.insert(project.id.clone(), project);
            Self(Mutex::new(map))
        }
    }

    #[async_trait]
    impl ProjectRepository for FakeProjects {
        async fn create(&self, project: &Project) -> Result<Project, AppError> {
            self.0
                .lock()
                .unwrap()
                .insert(project.id.clone(), project.clone());
            Ok(project.clone())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Project>, AppError> {
            Ok(self.0.lock().unwrap().get(id).cloned())
        }

        async fn find_by_name_and_environment(
            &self,
            name: &str,
            environment: &str,
        ) -> Result<Option<Project>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .find(|p| p.name == name && p.environment == environment)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<Project>, AppError> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }

        async fn update(&self, project: &Project) -> Result<Project, AppError> {
            self.0
                .lock()
                .unwrap()
                .insert(project.id.clone(), project.clone());
            Ok(project.clone())
        }

        async fn set_user_table_name(&self, id: &str, table: &str) -> Result<(), AppError> {
            if let Some(p) = self.0.lock().unwrap().get_mut(id) {
                p.user_table_name = table.to_string();
            }
            Ok(())
        }

        async fn update_signing_secret(&self, id: &str, secret: &str) -> Result<(), AppError> {
            if let Some(p) = self.0.lock().unwrap().get_mut(id) {
                p.signing_secret = secret.to_string();
            }
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<bool, AppError> {
            Ok(self.0.lock().unwrap().remove(id).is_some())
        }
    }

    #[derive(Default)]
    struct FakeUsers(Mutex<Vec<User>>);

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn find_by_email(
            &self,
            _table: &str,
            email: &str,
        ) -> Result<Option<User>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email && u.status != "deleted")
                .cloned())
        }

        async fn find_by_email_any_status(
            &self,
            _table: &str,
            email: &str,
        ) -> Result<Option<User>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_id(&self, _table: &str, id: Uuid) -> Result<Option<User>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id && u.status != "deleted")
                .cloned())
        }

        async fn find_by_oauth_identity(
            &self,
            _table: &str,
            provider: &str,
            provider_user_id: &str,
        ) -> Result<Option<User>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| {
                    u.oauth_provider.as_deref() == Some(provider)
                        && u.oauth_provider_user_id.as_deref() == Some(provider_user_id)
                        && u.status != "deleted"
                })
                .cloned())
        }

        async fn create(&self, _table: &str, user: &User) -> Result<User, AppError> {
            self.0.lock().unwrap().push(user.clone());
            Ok(user.clone())
        }

        async fn update(&self, _table: &str, user: &User) -> Result<User, AppError> {
            let mut users = self.0.lock().unwrap();
            if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
                *existing = user.clone();
            }
            Ok(user.clone())
        }

        async fn update_password(
            &self,
            _table: &str,
            id: Uuid,
            password_hash: &str,
        ) -> Result<(), AppError> {
            let mut users = self.0.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.password_hash = Some(password_hash.to_string());
            }
            Ok(())
        }

        async fn update_last_login(&self, _table: &str, id: Uuid) -> Result<(), AppError> {
            let mut users = self.0.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.last_login_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn set_email_verified(&self, _table: &str, id: Uuid) -> Result<(), AppError> {
            let mut users = self.0.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.email_verified = true;
            }
            Ok(())
        }

        async fn set_status(
            &self,
            _table: &str,
            id: Uuid,
            status: &str,
        ) -> Result<(), AppError> {
            let mut users = self.0.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.status = status.to_string();
            }
            Ok(())
        }

        async fn list(
            &self,
            _table: &str,
            _page: i64,
            _page_size: i64,
        ) -> Result<(Vec<User>, i64), AppError> {
            let users: Vec<User> = self
                .0
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.status != "deleted")
                .cloned()
                .collect();
            let total = users.len() as i64;
            Ok((users, total))
        }
    }

    #[derive(Default)]
    struct FakeRefreshTokens(Mutex<Vec<RefreshToken>>);

    #[async_trait]
    impl RefreshTokenRepository for FakeRefreshTokens {
        async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError> {
            let mut tokens = self.0.lock().unwrap();
            // token_hash UNIQUE
            if tokens.iter().any(|t| t.token_hash == token.token_hash) {
                return Err(AppError::Conflict("duplicate token hash".to_string()));
            }
            tokens.push(token.clone());
            Ok(token.clone())
        }

        async fn find_by_hash(
            &self,
            project_id: &str,
            token_hash: &str,
        ) -> Result<Option<RefreshToken>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.project_id == project_id && t.token_hash == token_hash)
                .cloned())
        }

        async fn rotate(
            &self,
            old_id: Uuid,
            replacement: &RefreshToken,
        ) -> Result<RefreshToken, AppError> {
            let mut tokens = self.0.lock().unwrap();
            let old = tokens
                .iter_mut()
                .find(|t| t.id == old_id && !t.revoked)
                .ok_or_else(|| AppError::AuthFailure("Invalid refresh token".to_string()))?;
            old.revoked = true;
            old.revoked_at = Some(Utc::now());
            old.revoked_reason = Some("rotated".to_string());
            old.last_used_at = Some(Utc::now());
            tokens.push(replacement.clone());
            Ok(replacement.clone())
        }

        async fn revoke(&self, id: Uuid, reason: &str) -> Result<(), AppError> {
            let mut tokens = self.0.lock().unwrap();
            if let Some(t) = tokens.iter_mut().find(|t| t.id == id && !t.revoked) {
                t.revoked = true;
                t.revoked_at = Some(Utc::now());
                t.revoked_reason = Some(reason.to_string());
            }
            Ok(())
        }

        async fn revoke_all_for_user(
            &self,
            project_id: &str,
            user_id: Uuid,
            reason: &str,
        ) -> Result<u64, AppError> {
            let mut tokens = self.0.lock().unwrap();
            let mut count = 0;
            for t in tokens
                .iter_mut()
                .filter(|t| t.project_id == project_id && t.user_id == user_id && !t.revoked)
            {
                t.revoked = true;
                t.revoked_at = Some(Utc::now());
                t.revoked_reason = Some(reason.to_string());
                count += 1;
            }
            Ok(count)
        }

        async fn delete_expired(&self) -> Result<u64, AppError> {
            let mut tokens = self.0.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| !t.is_expired());
            Ok((before - tokens.len()) as u64)
        }
    }

    /// Limiter that never trips and drops attempt rows
    struct OpenLimiter;

    #[async_trait]
    impl RateLimiter for OpenLimiter {
        async fn check(
            &self,
            _project_id: &str,
            _ip: Option<&str>,
            _email: Option<&str>,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn record(&self, _attempt: &AuthAttempt) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn test_project() -> Project {
        let now = Utc::now();
        Project {
            id: "acme".into(),
            name: "Acme".into(),
            description: None,
            environment: "development".into(),
            signing_secret: STANDARD.encode([7u8; 32]),
            signing_algorithm: "HS256".into(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 604_800,
            enabled: true,
            user_table_name: "acme_users".into(),
            site_url: Some("https://acme.example.com".into()),
            redirect_allowlist: sqlx::types::Json(vec![]),
            created_at: now,
            updated_at: now,
        }
    }

    fn engine() -> AuthServiceImpl<FakeProjects, FakeUsers, FakeRefreshTokens> {
        AuthServiceImpl::new(
            Arc::new(FakeProjects::with_project(test_project())),
            Arc::new(FakeUsers::default()),
            Arc::new(FakeRefreshTokens::default()),
            Arc::new(OpenLimiter),
            Arc::new(NoOpAuditLogRepository),
        )
    }

    fn register_req(email: &str, password: &str) -> RegisterReq {
        RegisterReq {
            email: email.into(),
            password: password.into(),
            display_name: Some("Jane".into()),
        }
    }

    #[tokio::test]
    async fn test_register_mints_verifiable_pair() {
        let engine = engine();
        let resp = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        assert_eq!(resp.token_type, "Bearer");
        assert_eq!(resp.expires_in, 3600);
        assert_eq!(resp.refresh_token.len(), 64);
        assert!(!resp.user.email_verified);

        let claims = engine
            .verify_access_token("acme", &resp.access_token)
            .await
            .unwrap();
        assert_eq!(claims.sub, resp.user.id);
        assert_eq!(claims.project_id, "acme");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let engine = engine();
        engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        let err = engine
            .register("acme", register_req("a@x.com", "Bbbbbbb2"), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_weak_password_rejected() {
        let engine = engine();
        let err = engine
            .register("acme", register_req("a@x.com", "alllowercase1"), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reactivation_revives_tombstoned_row() {
        let engine = engine();
        let first = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        engine
            .user_repo
            .set_status("acme_users", first.user.id, "deleted")
            .await
            .unwrap();

        let second = engine
            .register("acme", register_req("a@x.com", "Bbbbbbb1"), RequestMeta::default())
            .await
            .unwrap();

        // Same row id, fresh verification state, new credentials
        assert_eq!(second.user.id, first.user.id);
        assert!(!second.user.email_verified);

        let err = engine
            .login(
                "acme",
                LoginReq {
                    email: "a@x.com".into(),
                    password: "Aaaaaaa1".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));

        engine
            .login(
                "acme",
                LoginReq {
                    email: "a@x.com".into(),
                    password: "Bbbbbbb1".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_generic() {
        let engine = engine();
        engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        let wrong_password = engine
            .login(
                "acme",
                LoginReq {
                    email: "a@x.com".into(),
                    password: "Wrong1234".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap_err();
        let unknown_user = engine
            .login(
                "acme",
                LoginReq {
                    email: "nobody@x.com".into(),
                    password: "Wrong1234".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap_err();

        // Identical message regardless of which part mismatched
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_reuse_detection() {
        let engine = engine();
        let resp = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();
        let r1 = resp.refresh_token;

        let pair2 = engine
            .refresh("acme", &r1, RequestMeta::default())
            .await
            .unwrap();
        let r2 = pair2.refresh_token;
        assert_ne!(r1, r2);

        // Replaying the rotated token fails and revokes the whole user
        let err = engine
            .refresh("acme", &r1, RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));

        let err = engine
            .refresh("acme", &r2, RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let engine = engine();
        let resp = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        engine.logout("acme", &resp.refresh_token).await.unwrap();

        let err = engine
            .refresh("acme", &resp.refresh_token, RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_revoke_all_then_refresh_fails() {
        let engine = engine();
        let resp = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        let revoked = engine
            .revoke_all_user_tokens("acme", resp.user.id)
            .await
            .unwrap();
        assert_eq!(revoked, 1);

        let err = engine
            .refresh("acme", &resp.refresh_token, RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_disabled_project_refuses_auth() {
        let project_repo = Arc::new(FakeProjects::with_project({
            let mut p = test_project();
            p.enabled = false;
            p
        }));
        let engine = AuthServiceImpl::new(
            project_repo,
            Arc::new(FakeUsers::default()),
            Arc::new(FakeRefreshTokens::default()),
            Arc::new(OpenLimiter),
            Arc::new(NoOpAuditLogRepository),
        );

        let err = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
    }

    #[tokio::test]
    async fn test_unknown_project_not_found() {
        let engine = engine();
        let err = engine
            .register("ghost", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cross_project_token_rejected() {
        let projects = FakeProjects::with_project(test_project());
        let mut other = test_project();
        other.id = "other".into();
        other.name = "Other".into();
        other.user_table_name = "other_users".into();
        projects.create(&other).await.unwrap();

        let engine = AuthServiceImpl::new(
            Arc::new(projects),
            Arc::new(FakeUsers::default()),
            Arc::new(FakeRefreshTokens::default()),
            Arc::new(OpenLimiter),
            Arc::new(NoOpAuditLogRepository),
        );

        let resp = engine
            .register("acme", register_req("a@x.com", "Aaaaaaa1"), RequestMeta::default())
            .await
            .unwrap();

        // Same signing secret in both projects; the claim check still rejects
        let err = engine
            .verify_access_token("other", &resp.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));
    }
}
