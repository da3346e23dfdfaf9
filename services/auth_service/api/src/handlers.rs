use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use auth_service_core::domains::admin::domain::service::AdminAuthService;
use auth_service_core::domains::audit::domain::repository::AuditLogRepository;
use auth_service_core::domains::auth::domain::service::{
    AuthService, EmailVerificationService, PasswordResetService,
};
use auth_service_core::domains::auth::dto::auth_dto::*;
use auth_service_core::domains::email::domain::repository::{
    EmailProviderRepository, EmailTemplateRepository,
};
use auth_service_core::domains::oauth::domain::service::OAuthService;
use auth_service_core::domains::project::domain::service::ProjectService;
use shared_error::AppError;

use crate::extractors::{bearer_token, ClientInfo};
use crate::response::ok;

/// Application state containing service dependencies
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub password_reset_service: Arc<dyn PasswordResetService>,
    pub email_verification_service: Arc<dyn EmailVerificationService>,
    pub oauth_service: Arc<dyn OAuthService>,
    pub admin_service: Arc<dyn AdminAuthService>,
    pub project_service: Arc<dyn ProjectService>,
    pub email_provider_repo: Arc<dyn EmailProviderRepository>,
    pub email_template_repo: Arc<dyn EmailTemplateRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    operation_id = "health_check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResp),
    )
)]
pub async fn health_check() -> Json<HealthResp> {
    Json(HealthResp {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Register a new user in a project
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/register",
    tag = "auth",
    operation_id = "register",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = AuthResp),
        (status = 400, description = "Invalid request", body = ErrorResp),
        (status = 409, description = "Email already registered", body = ErrorResp),
        (status = 429, description = "Too many attempts", body = ErrorResp),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    ClientInfo(meta): ClientInfo,
    Json(payload): Json<RegisterReq>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let resp = state.auth_service.register(&project_id, payload, meta).await?;
    Ok((StatusCode::CREATED, ok(resp)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/login",
    tag = "auth",
    operation_id = "login",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful", body = AuthResp),
        (status = 401, description = "Invalid credentials", body = ErrorResp),
        (status = 429, description = "Too many attempts", body = ErrorResp),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    ClientInfo(meta): ClientInfo,
    Json(payload): Json<LoginReq>,
) -> Result<Json<Value>, AppError> {
    let resp = state.auth_service.login(&project_id, payload, meta).await?;
    Ok(ok(resp))
}

/// Rotate a refresh token into a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/refresh",
    tag = "auth",
    operation_id = "refresh",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = RefreshReq,
    responses(
        (status = 200, description = "Token pair rotated", body = TokenPairResp),
        (status = 401, description = "Invalid refresh token", body = ErrorResp),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    ClientInfo(meta): ClientInfo,
    Json(payload): Json<RefreshReq>,
) -> Result<Json<Value>, AppError> {
    let resp = state
        .auth_service
        .refresh(&project_id, &payload.refresh_token, meta)
        .await?;
    Ok(ok(resp))
}

/// Revoke the presented refresh token
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/logout",
    tag = "auth",
    operation_id = "logout",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = LogoutReq,
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Invalid refresh token", body = ErrorResp),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(payload): Json<LogoutReq>,
) -> Result<Json<Value>, AppError> {
    state
        .auth_service
        .logout(&project_id, &payload.refresh_token)
        .await?;
    Ok(crate::response::ok_message("Logged out"))
}

/// Current user from the bearer access token
#[utoipa::path(
    get,
    path = "/api/auth/{project_id}/me",
    tag = "auth",
    operation_id = "me",
    params(("project_id" = String, Path, description = "Project slug")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Invalid or expired token", body = ErrorResp),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers)?;
    let claims = state
        .auth_service
        .verify_access_token(&project_id, &token)
        .await?;
    let user = state.auth_service.get_user(&project_id, claims.sub).await?;
    Ok(ok(user))
}
