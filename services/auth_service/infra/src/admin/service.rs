use async_trait::async_trait;
use chrono::{Duration, Utc};
use shared_error::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use auth_service_core::domains::admin::{
    domain::{
        model::{AdminSession, AdminUser},
        repository::{AdminSessionRepository, AdminUserRepository},
        service::AdminAuthService,
    },
    dto::admin_dto::{
        AdminInfo, AdminLoginReq, AdminLoginResp, ChangeAdminPasswordReq, CreateAdminReq,
        UpdateAdminReq,
    },
};
use auth_service_core::domains::audit::domain::{model::AuditEvent, repository::AuditLogRepository};
use auth_service_core::domains::auth::dto::auth_dto::RequestMeta;
use auth_service_core::domains::auth::utils::password_policy::validate_admin_password;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{generate_token, hash_token, REFRESH_TOKEN_LEN};

/// Admin session service implementation
///
/// Opaque 64-char bearer tokens, SHA-256 at rest, sliding expiry renewed on
/// every verified request.
pub struct AdminAuthServiceImpl<AR, SR>
where
    AR: AdminUserRepository,
    SR: AdminSessionRepository,
{
    admin_repo: Arc<AR>,
    session_repo: Arc<SR>,
    audit_log: Arc<dyn AuditLogRepository>,
    session_minutes: i64,
}

impl<AR, SR> AdminAuthServiceImpl<AR, SR>
where
    AR: AdminUserRepository,
    SR: AdminSessionRepository,
{
    pub fn new(
        admin_repo: Arc<AR>,
        session_repo: Arc<SR>,
        audit_log: Arc<dyn AuditLogRepository>,
        session_minutes: i64,
    ) -> Self {
        Self {
            admin_repo,
            session_repo,
            audit_log,
            session_minutes,
        }
    }

    /// Create the bootstrap admin when the table is empty
    pub async fn ensure_bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        if self.admin_repo.count().await? > 0 {
            return Ok(());
        }
        validate_admin_password(password).map_err(AppError::Validation)?;

        let now = Utc::now();
        let admin = AdminUser {
            id: Uuid::now_v7(),
            email: email.to_string(),
            password_hash: hash_password(password).await?,
            name: None,
            role: "super_admin".to_string(),
            enabled: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.admin_repo.create(&admin).await?;

        tracing::warn!(email = %email, "Bootstrap super_admin created");
        Ok(())
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.log(event).await {
            tracing::warn!(error = %e, "Audit write failed");
        }
    }
}

#[async_trait]
impl<AR, SR> AdminAuthService for AdminAuthServiceImpl<AR, SR>
where
    AR: AdminUserRepository + Send + Sync,
    SR: AdminSessionRepository + Send + Sync,
{
    async fn login(
        &self,
        req: AdminLoginReq,
        meta: RequestMeta,
    ) -> Result<AdminLoginResp, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let admin = self
            .admin_repo
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid credentials".to_string()))?;

        if !verify_password(&req.password, &admin.password_hash).await? {
            self.audit(
                AuditEvent::failure(None, "admin_login_failed")
                    .with_admin(admin.id)
                    .with_request_context(meta.ip_address.clone(), meta.user_agent.clone()),
            )
            .await;
            return Err(AppError::AuthFailure("Invalid credentials".to_string()));
        }
        if !admin.enabled {
            return Err(AppError::AuthFailure("Account is disabled".to_string()));
        }

        let plaintext = generate_token(REFRESH_TOKEN_LEN);
        let session = AdminSession::new(
            admin.id,
            hash_token(&plaintext),
            self.session_minutes,
            meta.ip_address.clone(),
            meta.user_agent.clone(),
        );
        let created = self.session_repo.create(&session).await?;
        self.admin_repo.update_last_login(admin.id).await?;

        self.audit(
            AuditEvent::success(None, "admin_login")
                .with_admin(admin.id)
                .with_request_context(meta.ip_address, meta.user_agent),
        )
        .await;

        Ok(AdminLoginResp {
            session_token: plaintext,
            expires_at: created.expires_at,
            admin: (&admin).into(),
        })
    }

    async fn verify_session(&self, token: &str) -> Result<AdminInfo, AppError> {
        let session = self
            .session_repo
            .find_by_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid or expired session".to_string()))?;

        if session.is_expired() {
            return Err(AppError::AuthFailure("Invalid or expired session".to_string()));
        }

        let admin = self
            .admin_repo
            .find_by_id(session.admin_user_id)
            .await?
            .ok_or_else(|| AppError::AuthFailure("Invalid or expired session".to_string()))?;

        if !admin.enabled {
            return Err(AppError::AuthFailure("Account is disabled".to_string()));
        }

        // Sliding expiry
        self.session_repo
            .extend(session.id, Utc::now() + Duration::minutes(self.session_minutes))
            .await?;

        Ok((&admin).into())
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.session_repo.delete_by_hash(&hash_token(token)).await?;
        Ok(())
    }

    async fn create_admin(&self, req: CreateAdminReq) -> Result<AdminInfo, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_admin_password(&req.password).map_err(AppError::Validation)?;

        if self.admin_repo.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("Admin email already exists".to_string()));
        }

        let now = Utc::now();
        let admin = AdminUser {
            id: Uuid::now_v7(),
            email: req.email,
            password_hash: hash_password(&req.password).await?,
            name: req.name,
            role: req.role,
            enabled: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.admin_repo.create(&admin).await?;

        self.audit(AuditEvent::success(None, "admin_created").with_admin(created.id))
            .await;
        Ok((&created).into())
    }

    async fn update_admin(&self, id: Uuid, req: UpdateAdminReq) -> Result<AdminInfo, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut admin = self
            .admin_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        if let Some(name) = req.name {
            admin.name = Some(name);
        }
        if let Some(role) = req.role {
            admin.role = role;
        }
        if let Some(enabled) = req.enabled {
            admin.enabled = enabled;
            if !enabled {
                // Disabled admins lose their live sessions immediately
                self.session_repo.delete_all_for_admin(id).await?;
            }
        }

        let updated = self.admin_repo.update(&admin).await?;
        Ok((&updated).into())
    }

    async fn change_password(
        &self,
        id: Uuid,
        req: ChangeAdminPasswordReq,
    ) -> Result<(), AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        validate_admin_password(&req.new_password).map_err(AppError::Validation)?;

        let admin = self
            .admin_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;

        // Self-service semantics: the target admin's own current password is
        // required no matter who the caller is
        if !verify_password(&req.current_password, &admin.password_hash).await? {
            return Err(AppError::AuthFailure("Current password is incorrect".to_string()));
        }

        let password_hash = hash_password(&req.new_password).await?;
        self.admin_repo.update_password(id, &password_hash).await?;

        self.audit(AuditEvent::success(None, "admin_password_changed").with_admin(id))
            .await;
        Ok(())
    }

    async fn list_admins(&self) -> Result<Vec<AdminInfo>, AppError> {
        let admins = self.admin_repo.list().await?;
        Ok(admins.iter().map(Into::into).collect())
    }

    async fn get_admin(&self, id: Uuid) -> Result<AdminInfo, AppError> {
        let admin = self
            .admin_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))?;
        Ok((&admin).into())
    }

    async fn delete_admin(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self.admin_repo.delete(id).await?;
        if !deleted {
            return Err(AppError::NotFound("Admin not found".to_string()));
        }
        self.audit(AuditEvent::success(None, "admin_deleted").with_admin(id))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_service_core::domains::admin::domain::model::AdminSession;
    use auth_service_core::domains::audit::domain::repository::NoOpAuditLogRepository;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAdmins(Mutex<Vec<AdminUser>>);

    #[async_trait]
    impl AdminUserRepository for FakeAdmins {
        async fn create(&self, admin: &AdminUser) -> Result<AdminUser, AppError> {
            let mut admins = self.0.lock().unwrap();
            if admins.iter().any(|a| a.email == admin.email) {
                return Err(AppError::Conflict("duplicate email".to_string()));
            }
            admins.push(admin.clone());
            Ok(admin.clone())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError> {
            Ok(self.0.lock().unwrap().iter().find(|a| a.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.email == email)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<AdminUser>, AppError> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn update(&self, admin: &AdminUser) -> Result<AdminUser, AppError> {
            let mut admins = self.0.lock().unwrap();
            if let Some(a) = admins.iter_mut().find(|a| a.id == admin.id) {
                *a = admin.clone();
            }
            Ok(admin.clone())
        }

        async fn update_password(&self, id: Uuid, hash: &str) -> Result<(), AppError> {
            let mut admins = self.0.lock().unwrap();
            if let Some(a) = admins.iter_mut().find(|a| a.id == id) {
                a.password_hash = hash.to_string();
            }
            Ok(())
        }

        async fn update_last_login(&self, id: Uuid) -> Result<(), AppError> {
            let mut admins = self.0.lock().unwrap();
            if let Some(a) = admins.iter_mut().find(|a| a.id == id) {
                a.last_login_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut admins = self.0.lock().unwrap();
            let before = admins.len();
            admins.retain(|a| a.id != id);
            Ok(admins.len() < before)
        }

        async fn count(&self) -> Result<i64, AppError> {
            Ok(self.0.lock().unwrap().len() as i64)
        }
    }

    #[derive(Default)]
    struct FakeSessions(Mutex<Vec<AdminSession>>);

    #[async_trait]
    impl AdminSessionRepository for FakeSessions {
        async fn create(&self, session: &AdminSession) -> Result<AdminSession, AppError> {
            self.0.lock().unwrap().push(session.clone());
            Ok(session.clone())
        }

        async fn find_by_hash(&self, hash: &str) -> Result<Option<AdminSession>, AppError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.token_hash == hash)
                .cloned())
        }

        async fn extend(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<(), AppError> {
            let mut sessions = self.0.lock().unwrap();
            if let Some(s) = sessions.iter_mut().find(|s| s.id == id) {
                s.expires_at = expires_at;
                s.last_activity_at = Utc::now();
            }
            Ok(())
        }

        async fn delete_by_hash(&self, hash: &str) -> Result<bool, AppError> {
            let mut sessions = self.0.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|s| s.token_hash != hash);
            Ok(sessions.len() < before)
        }

        async fn delete_all_for_admin(&self, admin_id: Uuid) -> Result<u64, AppError> {
            let mut sessions = self.0.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|s| s.admin_user_id != admin_id);
            Ok((before - sessions.len()) as u64)
        }

        async fn delete_expired(&self) -> Result<u64, AppError> {
            let mut sessions = self.0.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|s| !s.is_expired());
            Ok((before - sessions.len()) as u64)
        }
    }

    fn service() -> AdminAuthServiceImpl<FakeAdmins, FakeSessions> {
        AdminAuthServiceImpl::new(
            Arc::new(FakeAdmins::default()),
            Arc::new(FakeSessions::default()),
            Arc::new(NoOpAuditLogRepository),
            30,
        )
    }

    async fn create_test_admin(service: &AdminAuthServiceImpl<FakeAdmins, FakeSessions>) -> AdminInfo {
        service
            .create_admin(CreateAdminReq {
                email: "ops@example.com".into(),
                password: "a-long-enough-password".into(),
                name: Some("Ops".into()),
                role: "admin".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_and_verify_session() {
        let service = service();
        create_test_admin(&service).await;

        let resp = service
            .login(
                AdminLoginReq {
                    email: "ops@example.com".into(),
                    password: "a-long-enough-password".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();
        assert_eq!(resp.session_token.len(), 64);

        let verified = service.verify_session(&resp.session_token).await.unwrap();
        assert_eq!(verified.email, "ops@example.com");
        assert_eq!(verified.role, "admin");
    }

    #[tokio::test]
    async fn test_verify_slides_expiry() {
        let service = service();
        create_test_admin(&service).await;
        let resp = service
            .login(
                AdminLoginReq {
                    email: "ops@example.com".into(),
                    password: "a-long-enough-password".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();

        let before = service
            .session_repo
            .find_by_hash(&hash_token(&resp.session_token))
            .await
            .unwrap()
            .unwrap()
            .expires_at;

        service.verify_session(&resp.session_token).await.unwrap();

        let after = service
            .session_repo
            .find_by_hash(&hash_token(&resp.session_token))
            .await
            .unwrap()
            .unwrap()
            .expires_at;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let service = service();
        let admin = create_test_admin(&service).await;

        let token = generate_token(REFRESH_TOKEN_LEN);
        let mut session = AdminSession::new(admin.id, hash_token(&token), 30, None, None);
        session.expires_at = Utc::now() - Duration::minutes(1);
        service.session_repo.create(&session).await.unwrap();

        assert!(service.verify_session(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let service = service();
        create_test_admin(&service).await;
        let resp = service
            .login(
                AdminLoginReq {
                    email: "ops@example.com".into(),
                    password: "a-long-enough-password".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();

        service.logout(&resp.session_token).await.unwrap();
        assert!(service.verify_session(&resp.session_token).await.is_err());
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let service = service();
        let admin = create_test_admin(&service).await;

        let err = service
            .change_password(
                admin.id,
                ChangeAdminPasswordReq {
                    current_password: "wrong-password-entirely".into(),
                    new_password: "a-brand-new-password".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthFailure(_)));

        service
            .change_password(
                admin.id,
                ChangeAdminPasswordReq {
                    current_password: "a-long-enough-password".into(),
                    new_password: "a-brand-new-password".into(),
                },
            )
            .await
            .unwrap();

        service
            .login(
                AdminLoginReq {
                    email: "ops@example.com".into(),
                    password: "a-brand-new-password".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_admin_email_conflicts() {
        let service = service();
        create_test_admin(&service).await;

        let err = service
            .create_admin(CreateAdminReq {
                email: "ops@example.com".into(),
                password: "another-long-password".into(),
                name: None,
                role: "viewer".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_disabling_admin_kills_sessions() {
        let service = service();
        let admin = create_test_admin(&service).await;
        let resp = service
            .login(
                AdminLoginReq {
                    email: "ops@example.com".into(),
                    password: "a-long-enough-password".into(),
                },
                RequestMeta::default(),
            )
            .await
            .unwrap();

        service
            .update_admin(
                admin.id,
                UpdateAdminReq {
                    enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(service.verify_session(&resp.session_token).await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_when_empty() {
        let service = service();
        service
            .ensure_bootstrap_admin("root@example.com", "bootstrap-password")
            .await
            .unwrap();
        assert_eq!(service.admin_repo.count().await.unwrap(), 1);

        // Second call is a no-op
        service
            .ensure_bootstrap_admin("other@example.com", "bootstrap-password")
            .await
            .unwrap();
        assert_eq!(service.admin_repo.count().await.unwrap(), 1);
    }
}
