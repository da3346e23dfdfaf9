//! Password-reset and email-confirmation flows over in-memory fakes
//!
//! The emitted token is captured through the email values map, the way a real
//! recipient would receive it.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use auth_service_core::domains::audit::domain::repository::NoOpAuditLogRepository;
use auth_service_core::domains::auth::domain::model::{AuthAttempt, RefreshToken, SingleUseToken, User};
use auth_service_core::domains::auth::domain::rate_limiter::RateLimiter;
use auth_service_core::domains::auth::domain::repository::{
    RefreshTokenRepository, SingleUseTokenRepository, UserRepository,
};
use auth_service_core::domains::auth::domain::service::{
    EmailVerificationService, PasswordResetService,
};
use auth_service_core::domains::auth::dto::auth_dto::RequestMeta;
use auth_service_core::domains::email::domain::service::EmailService;
use auth_service_core::domains::project::domain::model::Project;
use auth_service_core::domains::project::domain::repository::ProjectRepository;
use auth_service_infra::auth::password::{hash_password, verify_password};
use auth_service_infra::auth::{EmailVerificationServiceImpl, PasswordResetServiceImpl};
use shared_error::AppError;

// ---------------------------------------------------------------------------
// Fakes

struct FakeProjects(Project);

#[async_trait]
impl ProjectRepository for FakeProjects {
    async fn create(&self, project: &Project) -> Result<Project, AppError> {
        Ok(project.clone())
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, AppError> {
        Ok((self.0.id == id).then(|| self.0.clone()))
    }
    async fn find_by_name_and_environment(
        &self,
        _name: &str,
        _environment: &str,
    ) -> Result<Option<Project>, AppError> {
        Ok(None)
    }
    async fn list(&self) -> Result<Vec<Project>, AppError> {
        Ok(vec![self.0.clone()])
    }
    async fn update(&self, project: &Project) -> Result<Project, AppError> {
        Ok(project.clone())
    }
    async fn set_user_table_name(&self, _id: &str, _table: &str) -> Result<(), AppError> {
        Ok(())
    }
    async fn update_signing_secret(&self, _id: &str, _secret: &str) -> Result<(), AppError> {
        Ok(())
    }
    async fn delete(&self, _id: &str) -> Result<bool, AppError> {
        Ok(false)
    }
}

#[derive(Default)]
struct FakeUsers(Mutex<Vec<User>>);

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_email(&self, _t: &str, email: &str) -> Result<Option<User>, AppError> {
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
        _t: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.0.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }
    async fn find_by_id(&self, _t: &str, id: Uuid) -> Result<Option<User>, AppError> {
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
        _t: &str,
        _provider: &str,
        _provider_user_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(None)
    }
    async fn create(&self, _t: &str, user: &User) -> Result<User, AppError> {
        self.0.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }
    async fn update(&self, _t: &str, user: &User) -> Result<User, AppError> {
        let mut users = self.0.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == user.id) {
            *u = user.clone();
        }
        Ok(user.clone())
    }
    async fn update_password(
        &self,
        _t: &str,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut users = self.0.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.password_hash = Some(password_hash.to_string());
        }
        Ok(())
    }
    async fn update_last_login(&self, _t: &str, _id: Uuid) -> Result<(), AppError> {
        Ok(())
    }
    async fn set_email_verified(&self, _t: &str, id: Uuid) -> Result<(), AppError> {
        let mut users = self.0.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.email_verified = true;
        }
        Ok(())
    }
    async fn set_status(&self, _t: &str, id: Uuid, status: &str) -> Result<(), AppError> {
        let mut users = self.0.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.status = status.to_string();
        }
        Ok(())
    }
    async fn list(&self, _t: &str, _p: i64, _s: i64) -> Result<(Vec<User>, i64), AppError> {
        Ok((vec![], 0))
    }
}

#[derive(Default)]
struct FakeSingleUseTokens(Mutex<Vec<SingleUseToken>>);

#[async_trait]
impl SingleUseTokenRepository for FakeSingleUseTokens {
    async fn create(&self, token: &SingleUseToken) -> Result<SingleUseToken, AppError> {
        self.0.lock().unwrap().push(token.clone());
        Ok(token.clone())
    }
    async fn find_by_hash(
        &self,
        project_id: &str,
        token_hash: &str,
    ) -> Result<Option<SingleUseToken>, AppError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.project_id == project_id && t.token_hash == token_hash)
            .cloned())
    }
    async fn mark_used(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tokens = self.0.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == id && t.used_at.is_none()) {
            Some(t) => {
                t.used_at = Some(Utc::now());
                Ok(true)
            },
            None => Ok(false),
        }
    }
    async fn mark_all_used_for_user(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        let mut tokens = self.0.lock().unwrap();
        let mut count = 0;
        for t in tokens
            .iter_mut()
            .filter(|t| t.project_id == project_id && t.user_id == user_id && t.used_at.is_none())
        {
            t.used_at = Some(Utc::now());
            count += 1;
        }
        Ok(count)
    }
    async fn delete_expired_before(&self, cutoff_unix: i64) -> Result<u64, AppError> {
        let mut tokens = self.0.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.expires_at >= cutoff_unix);
        Ok((before - tokens.len()) as u64)
    }
}

#[derive(Default)]
struct FakeRefreshTokens(Mutex<Vec<RefreshToken>>);

#[async_trait]
impl RefreshTokenRepository for FakeRefreshTokens {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, AppError> {
        self.0.lock().unwrap().push(token.clone());
        Ok(token.clone())
    }
    async fn find_by_hash(
        &self,
        _project_id: &str,
        _token_hash: &str,
    ) -> Result<Option<RefreshToken>, AppError> {
        Ok(None)
    }
    async fn rotate(
        &self,
        _old_id: Uuid,
        replacement: &RefreshToken,
    ) -> Result<RefreshToken, AppError> {
        Ok(replacement.clone())
    }
    async fn revoke(&self, _id: Uuid, _reason: &str) -> Result<(), AppError> {
        Ok(())
    }
    async fn revoke_all_for_user(
        &self,
        _project_id: &str,
        user_id: Uuid,
        reason: &str,
    ) -> Result<u64, AppError> {
        let mut tokens = self.0.lock().unwrap();
        let mut count = 0;
        for t in tokens.iter_mut().filter(|t| t.user_id == user_id && !t.revoked) {
            t.revoked = true;
            t.revoked_reason = Some(reason.to_string());
            count += 1;
        }
        Ok(count)
    }
    async fn delete_expired(&self) -> Result<u64, AppError> {
        Ok(0)
    }
}

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

/// Captures the values map of every templated send
#[derive(Default)]
struct CapturingMailer(Mutex<Vec<(String, String, HashMap<String, String>)>>);

#[async_trait]
impl EmailService for CapturingMailer {
    async fn send_templated(
        &self,
        _project: &Project,
        template_type: &str,
        to: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), AppError> {
        self.0
            .lock()
            .unwrap()
            .push((template_type.to_string(), to.to_string(), values.clone()));
        Ok(())
    }
}

impl CapturingMailer {
    fn last_url_value(&self, key: &str) -> Option<String> {
        self.0
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, _, values)| values.get(key).cloned())
    }
}

fn token_from_url(url: &str) -> String {
    url.split_once("token=").unwrap().1.to_string()
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

async fn seeded_user(users: &FakeUsers, email: &str, password: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        email: email.to_string(),
        email_verified: false,
        phone: None,
        phone_verified: false,
        password_hash: Some(hash_password(password).await.unwrap()),
        oauth_provider: None,
        oauth_provider_user_id: None,
        oauth_raw_user_data: None,
        display_name: None,
        avatar_url: None,
        metadata: None,
        status: "active".into(),
        created_at: now,
        updated_at: now,
        last_login_at: None,
    };
    users.create("acme_users", &user).await.unwrap()
}

struct ResetHarness {
    service: PasswordResetServiceImpl<FakeProjects, FakeUsers, FakeSingleUseTokens, FakeRefreshTokens>,
    users: Arc<FakeUsers>,
    tokens: Arc<FakeSingleUseTokens>,
    refresh: Arc<FakeRefreshTokens>,
    mailer: Arc<CapturingMailer>,
}

fn reset_harness() -> ResetHarness {
    let users = Arc::new(FakeUsers::default());
    let tokens = Arc::new(FakeSingleUseTokens::default());
    let refresh = Arc::new(FakeRefreshTokens::default());
    let mailer = Arc::new(CapturingMailer::default());

    let service = PasswordResetServiceImpl::new(
        Arc::new(FakeProjects(test_project())),
        users.clone(),
        tokens.clone(),
        refresh.clone(),
        Arc::new(OpenLimiter),
        Arc::new(NoOpAuditLogRepository),
        Some(mailer.clone() as Arc<dyn EmailService>),
    );

    ResetHarness {
        service,
        users,
        tokens,
        refresh,
        mailer,
    }
}

#[tokio::test]
async fn test_forgot_password_never_discloses() {
    let h = reset_harness();

    // Unknown email: same response, no token minted, no email sent
    let resp = h
        .service
        .request_reset("acme", "nobody@x.com", RequestMeta::default())
        .await
        .unwrap();
    assert!(resp.message.contains("If an account exists"));
    assert!(h.tokens.0.lock().unwrap().is_empty());
    assert!(h.mailer.0.lock().unwrap().is_empty());

    // Unknown project: still success
    let resp = h
        .service
        .request_reset("ghost", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    assert!(resp.message.contains("If an account exists"));
}

#[tokio::test]
async fn test_full_reset_flow_and_replay() {
    let h = reset_harness();
    let user = seeded_user(&h.users, "a@x.com", "Aaaaaaa1").await;

    h.service
        .request_reset("acme", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    let reset_url = h.mailer.last_url_value("reset_url").unwrap();
    let token = token_from_url(&reset_url);

    h.service
        .reset_password("acme", &token, "Bbbbbbb1")
        .await
        .unwrap();

    // Old password dead, new password live
    let stored = h
        .users
        .find_by_id("acme_users", user.id)
        .await
        .unwrap()
        .unwrap();
    let hash = stored.password_hash.unwrap();
    assert!(!verify_password("Aaaaaaa1", &hash).await.unwrap());
    assert!(verify_password("Bbbbbbb1", &hash).await.unwrap());

    // Replay fails: the token was consumed
    let err = h
        .service
        .reset_password("acme", &token, "Ccccccc1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthFailure(_)));
}

#[tokio::test]
async fn test_reset_revokes_outstanding_sessions() {
    let h = reset_harness();
    let user = seeded_user(&h.users, "a@x.com", "Aaaaaaa1").await;
    h.refresh
        .create(&RefreshToken::new("acme", user.id, "hash".into(), 3600, None, None))
        .await
        .unwrap();

    h.service
        .request_reset("acme", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    let token = token_from_url(&h.mailer.last_url_value("reset_url").unwrap());
    h.service
        .reset_password("acme", &token, "Bbbbbbb1")
        .await
        .unwrap();

    let tokens = h.refresh.0.lock().unwrap();
    assert!(tokens.iter().all(|t| t.revoked));
    assert_eq!(tokens[0].revoked_reason.as_deref(), Some("password_reset"));
}

#[tokio::test]
async fn test_new_request_invalidates_previous_token() {
    let h = reset_harness();
    seeded_user(&h.users, "a@x.com", "Aaaaaaa1").await;

    h.service
        .request_reset("acme", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    let first = token_from_url(&h.mailer.last_url_value("reset_url").unwrap());

    h.service
        .request_reset("acme", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    let second = token_from_url(&h.mailer.last_url_value("reset_url").unwrap());

    let err = h
        .service
        .reset_password("acme", &first, "Bbbbbbb1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthFailure(_)));

    h.service
        .reset_password("acme", &second, "Bbbbbbb1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_weak_new_password_rejected() {
    let h = reset_harness();
    seeded_user(&h.users, "a@x.com", "Aaaaaaa1").await;

    h.service
        .request_reset("acme", "a@x.com", RequestMeta::default())
        .await
        .unwrap();
    let token = token_from_url(&h.mailer.last_url_value("reset_url").unwrap());

    let err = h
        .service
        .reset_password("acme", &token, "weak")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_confirmation_flow() {
    let users = Arc::new(FakeUsers::default());
    let tokens = Arc::new(FakeSingleUseTokens::default());
    let mailer = Arc::new(CapturingMailer::default());

    let service = EmailVerificationServiceImpl::new(
        Arc::new(FakeProjects(test_project())),
        users.clone(),
        tokens.clone(),
        Arc::new(NoOpAuditLogRepository),
        Some(mailer.clone() as Arc<dyn EmailService>),
    );

    let user = seeded_user(&users, "a@x.com", "Aaaaaaa1").await;
    assert!(!user.email_verified);

    service.send_confirmation("acme", user.id).await.unwrap();
    let confirm_url = mailer.last_url_value("confirm_url").unwrap();
    let token = token_from_url(&confirm_url);

    let confirmed = service.confirm_email("acme", &token).await.unwrap();
    assert!(confirmed.email_verified);

    // Single use
    let err = service.confirm_email("acme", &token).await.unwrap_err();
    assert!(matches!(err, AppError::AuthFailure(_)));

    // Already-verified users get no further email
    let before = mailer.0.lock().unwrap().len();
    service.send_confirmation("acme", user.id).await.unwrap();
    assert_eq!(mailer.0.lock().unwrap().len(), before);
}
