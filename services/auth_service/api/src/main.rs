use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth_service_api::{create_router, AppState};
use auth_service_infra::admin::{
    AdminAuthServiceImpl, PgAdminSessionRepository, PgAdminUserRepository,
};
use auth_service_infra::audit::PgAuditLogRepository;
use auth_service_infra::auth::{
    AuthServiceImpl, DbRateLimiter, EmailVerificationServiceImpl, PasswordResetServiceImpl,
    PgAuthAttemptRepository, PgRefreshTokenRepository, PgSingleUseTokenRepository,
    PgUserRepository,
};
use auth_service_infra::email::{
    EmailServiceImpl, PgEmailProviderRepository, PgEmailTemplateRepository,
};
use auth_service_infra::oauth::{OAuthServiceImpl, PgOAuthProviderRepository, SecretBox};
use auth_service_infra::project::{
    PgProjectRepository, PgRateLimitRuleRepository, ProjectServiceImpl, UserTableManager,
};
use auth_service_infra::schema;

use auth_service_core::domains::audit::domain::repository::AuditLogRepository;
use auth_service_core::domains::auth::domain::rate_limiter::RateLimiter;
use auth_service_core::domains::auth::domain::repository::RefreshTokenRepository;
use auth_service_core::domains::auth::domain::service::{
    EmailVerificationService, PasswordResetService,
};
use auth_service_core::domains::email::domain::service::EmailService;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    tracing::info!("Auth service starting");

    let config = shared_config::Config::from_env().expect("Failed to load configuration");

    let db_pool = shared_db::init_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");
    schema::ensure_schema(&db_pool)
        .await
        .expect("Failed to ensure database schema");

    tracing::info!("Database ready");

    let outbound_timeout = Duration::from_secs(config.outbound_timeout_seconds);
    let secret_box = SecretBox::new(config.secret_encryption_key.as_deref())
        .expect("Invalid secret encryption key");
    if !secret_box.is_enabled() {
        tracing::warn!("No secret encryption key configured; OAuth client secrets stored in plaintext");
    }

    // Repositories
    let project_repo = Arc::new(PgProjectRepository::new(db_pool.clone()));
    let rule_repo = Arc::new(PgRateLimitRuleRepository::new(db_pool.clone()));
    let user_repo = Arc::new(PgUserRepository::new(db_pool.clone()));
    let refresh_repo = Arc::new(PgRefreshTokenRepository::new(db_pool.clone()));
    let single_use_repo = Arc::new(PgSingleUseTokenRepository::new(db_pool.clone()));
    let attempt_repo = Arc::new(PgAuthAttemptRepository::new(db_pool.clone()));
    let oauth_config_repo = Arc::new(PgOAuthProviderRepository::new(db_pool.clone()));
    let admin_repo = Arc::new(PgAdminUserRepository::new(db_pool.clone()));
    let admin_session_repo = Arc::new(PgAdminSessionRepository::new(db_pool.clone()));
    let email_provider_repo = Arc::new(PgEmailProviderRepository::new(db_pool.clone()));
    let email_template_repo = Arc::new(PgEmailTemplateRepository::new(db_pool.clone()));
    let audit_log: Arc<dyn AuditLogRepository> =
        Arc::new(PgAuditLogRepository::new(db_pool.clone()));

    // Cross-cutting services
    let rate_limiter: Arc<dyn RateLimiter> =
        Arc::new(DbRateLimiter::new(attempt_repo.clone(), rule_repo.clone()));
    let email_service: Arc<dyn EmailService> = Arc::new(EmailServiceImpl::new(
        email_provider_repo.clone(),
        email_template_repo.clone(),
        outbound_timeout,
    ));

    // Domain services
    let email_verification_service: Arc<dyn EmailVerificationService> =
        Arc::new(EmailVerificationServiceImpl::new(
            project_repo.clone(),
            user_repo.clone(),
            single_use_repo.clone(),
            audit_log.clone(),
            Some(email_service.clone()),
        ));

    let auth_service = Arc::new(
        AuthServiceImpl::new(
            project_repo.clone(),
            user_repo.clone(),
            refresh_repo.clone(),
            rate_limiter.clone(),
            audit_log.clone(),
        )
        .with_email_verification(email_verification_service.clone()),
    );

    let password_reset_service = Arc::new(PasswordResetServiceImpl::new(
        project_repo.clone(),
        user_repo.clone(),
        single_use_repo.clone(),
        refresh_repo.clone(),
        rate_limiter.clone(),
        audit_log.clone(),
        Some(email_service.clone()),
    ));

    let oauth_service = Arc::new(
        OAuthServiceImpl::new(
            oauth_config_repo.clone(),
            project_repo.clone(),
            user_repo.clone(),
            refresh_repo.clone(),
            rate_limiter.clone(),
            audit_log.clone(),
            secret_box,
            outbound_timeout,
        )
        .expect("Failed to build OAuth service"),
    );

    let admin_service = Arc::new(AdminAuthServiceImpl::new(
        admin_repo.clone(),
        admin_session_repo.clone(),
        audit_log.clone(),
        config.admin_session_minutes,
    ));

    if let (Some(email), Some(password)) = (
        &config.bootstrap_admin_email,
        &config.bootstrap_admin_password,
    ) {
        admin_service
            .ensure_bootstrap_admin(email, password)
            .await
            .expect("Failed to create bootstrap admin");
    }

    let project_service = Arc::new(ProjectServiceImpl::new(
        PgProjectRepository::new(db_pool.clone()),
        PgRateLimitRuleRepository::new(db_pool.clone()),
        UserTableManager::new(db_pool.clone()),
    ));

    let state = AppState {
        auth_service,
        password_reset_service,
        email_verification_service,
        oauth_service,
        admin_service,
        project_service,
        email_provider_repo,
        email_template_repo,
        audit_log,
    };

    tracing::info!("Services initialized");

    // Hourly cleanup of expired refresh and single-use tokens
    {
        let refresh_repo = refresh_repo.clone();
        let password_reset_service = state.password_reset_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match refresh_repo.delete_expired().await {
                    Ok(n) if n > 0 => tracing::info!(deleted = %n, "Expired refresh tokens removed"),
                    Ok(_) => {},
                    Err(e) => tracing::error!(error = %e, "Refresh token cleanup failed"),
                }
                if let Err(e) = password_reset_service.cleanup_expired_tokens().await {
                    tracing::error!(error = %e, "Single-use token cleanup failed");
                }
            }
        });
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid host/port");
    tracing::info!("Auth service listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/docs", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
