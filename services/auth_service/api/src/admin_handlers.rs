//! Admin API
//!
//! Authenticated by the `X-Admin-Session` header. Role gates: viewer reads,
//! admin mutates, super_admin manages admin accounts.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use auth_service_core::domains::admin::dto::admin_dto::{
    AdminInfo, AdminLoginReq, AdminLoginResp, ChangeAdminPasswordReq, CreateAdminReq,
    UpdateAdminReq,
};
use auth_service_core::domains::audit::domain::model::{AuditLogPage, AuditLogQuery};
use auth_service_core::domains::auth::dto::auth_dto::{ErrorResp, UserInfo, UserListResp};
use auth_service_core::domains::email::domain::model::{EmailProvider, EmailTemplate};
use auth_service_core::domains::email::dto::email_dto::{
    EmailProviderReq, EmailProviderResp, EmailTemplateReq, EmailTemplateResp,
};
use auth_service_core::domains::oauth::dto::oauth_dto::{OAuthProviderReq, OAuthProviderResp};
use auth_service_core::domains::project::dto::project_dto::{
    CreateProjectReq, ProjectResp, RateLimitRuleReq, RateLimitRuleResp, UpdateProjectReq,
};
use chrono::Utc;
use shared_error::AppError;
use validator::Validate;

use crate::extractors::{admin_session_token, ClientInfo};
use crate::handlers::AppState;
use crate::response::{ok, ok_message};

/// Verify the session header and return the acting admin
async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminInfo, AppError> {
    let token = admin_session_token(headers)?;
    state.admin_service.verify_session(&token).await
}

/// Viewer role is read-only
fn require_write(admin: &AdminInfo) -> Result<(), AppError> {
    if !admin.can_write() {
        return Err(AppError::Forbidden("Write access required".to_string()));
    }
    Ok(())
}

/// Admin account management is super_admin only
fn require_super_admin(admin: &AdminInfo) -> Result<(), AppError> {
    if !admin.is_super_admin() {
        return Err(AppError::Forbidden("Super admin role required".to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sessions

/// Admin login
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "admin-session",
    operation_id = "admin_login",
    request_body = AdminLoginReq,
    responses(
        (status = 200, description = "Session created", body = AdminLoginResp),
        (status = 401, description = "Invalid credentials", body = ErrorResp),
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    ClientInfo(meta): ClientInfo,
    Json(payload): Json<AdminLoginReq>,
) -> Result<Json<Value>, AppError> {
    let resp = state.admin_service.login(payload, meta).await?;
    Ok(ok(resp))
}

/// Admin logout
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "admin-session",
    operation_id = "admin_logout",
    responses((status = 200, description = "Session deleted"))
)]
pub async fn admin_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = admin_session_token(&headers)?;
    state.admin_service.logout(&token).await?;
    Ok(ok_message("Logged out"))
}

/// Acting admin for the presented session
#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "admin-session",
    operation_id = "admin_me",
    responses(
        (status = 200, description = "Current admin", body = AdminInfo),
        (status = 401, description = "Invalid session", body = ErrorResp),
    )
)]
pub async fn admin_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    Ok(ok(admin))
}

// ---------------------------------------------------------------------------
// Projects

#[utoipa::path(
    get,
    path = "/api/admin/projects",
    tag = "admin-projects",
    operation_id = "admin_list_projects",
    responses((status = 200, description = "All projects"))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let projects = state.project_service.list_projects().await?;
    Ok(ok(projects))
}

#[utoipa::path(
    post,
    path = "/api/admin/projects",
    tag = "admin-projects",
    operation_id = "admin_create_project",
    request_body = CreateProjectReq,
    responses(
        (status = 201, description = "Project created", body = ProjectResp),
        (status = 409, description = "Duplicate name or id", body = ErrorResp),
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProjectReq>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let project = state.project_service.create_project(payload).await?;
    Ok((StatusCode::CREATED, ok(project)))
}

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}",
    tag = "admin-projects",
    operation_id = "admin_get_project",
    params(("project_id" = String, Path, description = "Project slug")),
    responses(
        (status = 200, description = "Project details", body = ProjectResp),
        (status = 404, description = "Not found", body = ErrorResp),
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let project = state.project_service.get_project(&project_id).await?;
    Ok(ok(project))
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{project_id}",
    tag = "admin-projects",
    operation_id = "admin_update_project",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = UpdateProjectReq,
    responses((status = 200, description = "Project updated", body = ProjectResp))
)]
pub async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    Json(payload): Json<UpdateProjectReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let project = state
        .project_service
        .update_project(&project_id, payload)
        .await?;
    Ok(ok(project))
}

#[utoipa::path(
    post,
    path = "/api/admin/projects/{project_id}/rotate-secret",
    tag = "admin-projects",
    operation_id = "admin_rotate_signing_secret",
    params(("project_id" = String, Path, description = "Project slug")),
    responses((status = 200, description = "Secret rotated", body = ProjectResp))
)]
pub async fn rotate_signing_secret(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let project = state
        .project_service
        .rotate_signing_secret(&project_id)
        .await?;
    Ok(ok(project))
}

#[utoipa::path(
    delete,
    path = "/api/admin/projects/{project_id}",
    tag = "admin-projects",
    operation_id = "admin_delete_project",
    params(("project_id" = String, Path, description = "Project slug")),
    responses((status = 200, description = "Project and all tenant data deleted"))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    state.project_service.delete_project(&project_id).await?;
    Ok(ok_message("Project deleted"))
}

// ---------------------------------------------------------------------------
// Project users

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}/users",
    tag = "admin-users",
    operation_id = "admin_list_users",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("page_size" = Option<i64>, Query, description = "Page size (default 20)"),
    ),
    responses((status = 200, description = "Users in the project", body = UserListResp))
)]
pub async fn list_project_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let users = state
        .auth_service
        .list_users(
            &project_id,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(20),
        )
        .await?;
    Ok(ok(users))
}

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}/users/{user_id}",
    tag = "admin-users",
    operation_id = "admin_get_user",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses((status = 200, description = "User details", body = UserInfo))
)]
pub async fn get_project_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, user_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let user = state.auth_service.get_user(&project_id, user_id).await?;
    Ok(ok(user))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserStatusReq {
    pub status: String,
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{project_id}/users/{user_id}/status",
    tag = "admin-users",
    operation_id = "admin_set_user_status",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses((status = 200, description = "Status changed", body = UserInfo))
)]
pub async fn set_project_user_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, user_id)): Path<(String, Uuid)>,
    Json(payload): Json<UserStatusReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let user = state
        .auth_service
        .set_user_status(&project_id, user_id, &payload.status)
        .await?;
    Ok(ok(user))
}

#[utoipa::path(
    delete,
    path = "/api/admin/projects/{project_id}/users/{user_id}",
    tag = "admin-users",
    operation_id = "admin_delete_user",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses((status = 200, description = "User tombstoned", body = UserInfo))
)]
pub async fn delete_project_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, user_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    // Soft delete; the row stays for the reactivation rule
    let user = state
        .auth_service
        .set_user_status(&project_id, user_id, "deleted")
        .await?;
    Ok(ok(user))
}

// ---------------------------------------------------------------------------
// Admin accounts

#[utoipa::path(
    get,
    path = "/api/admin/admins",
    tag = "admin-accounts",
    operation_id = "admin_list_admins",
    responses((status = 200, description = "All admin accounts"))
)]
pub async fn list_admins(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_super_admin(&admin)?;
    let admins = state.admin_service.list_admins().await?;
    Ok(ok(admins))
}

#[utoipa::path(
    post,
    path = "/api/admin/admins",
    tag = "admin-accounts",
    operation_id = "admin_create_admin",
    request_body = CreateAdminReq,
    responses(
        (status = 201, description = "Admin created", body = AdminInfo),
        (status = 409, description = "Email already exists", body = ErrorResp),
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateAdminReq>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_super_admin(&admin)?;
    let created = state.admin_service.create_admin(payload).await?;
    Ok((StatusCode::CREATED, ok(created)))
}

#[utoipa::path(
    put,
    path = "/api/admin/admins/{admin_id}",
    tag = "admin-accounts",
    operation_id = "admin_update_admin",
    params(("admin_id" = Uuid, Path, description = "Admin id")),
    request_body = UpdateAdminReq,
    responses((status = 200, description = "Admin updated", body = AdminInfo))
)]
pub async fn update_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<UpdateAdminReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_super_admin(&admin)?;
    let updated = state.admin_service.update_admin(admin_id, payload).await?;
    Ok(ok(updated))
}

/// Change an admin password
///
/// Self-service semantics: the target admin's current password is required
/// even when a super_admin calls this for someone else.
#[utoipa::path(
    post,
    path = "/api/admin/admins/{admin_id}/change-password",
    tag = "admin-accounts",
    operation_id = "admin_change_password",
    params(("admin_id" = Uuid, Path, description = "Admin id")),
    request_body = ChangeAdminPasswordReq,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password incorrect", body = ErrorResp),
    )
)]
pub async fn change_admin_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<ChangeAdminPasswordReq>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    state.admin_service.change_password(admin_id, payload).await?;
    Ok(ok_message("Password changed"))
}

#[utoipa::path(
    delete,
    path = "/api/admin/admins/{admin_id}",
    tag = "admin-accounts",
    operation_id = "admin_delete_admin",
    params(("admin_id" = Uuid, Path, description = "Admin id")),
    responses((status = 200, description = "Admin deleted"))
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_super_admin(&admin)?;
    if admin.id == admin_id {
        return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
    }
    state.admin_service.delete_admin(admin_id).await?;
    Ok(ok_message("Admin deleted"))
}

// ---------------------------------------------------------------------------
// OAuth provider configs

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}/oauth-providers",
    tag = "admin-oauth",
    operation_id = "admin_list_oauth_providers",
    params(("project_id" = String, Path, description = "Project slug")),
    responses((status = 200, description = "Configured providers"))
)]
pub async fn list_oauth_providers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let providers = state.oauth_service.list_providers(&project_id).await?;
    Ok(ok(providers))
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{project_id}/oauth-providers",
    tag = "admin-oauth",
    operation_id = "admin_upsert_oauth_provider",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = OAuthProviderReq,
    responses((status = 200, description = "Provider stored", body = OAuthProviderResp))
)]
pub async fn upsert_oauth_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    Json(payload): Json<OAuthProviderReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let provider = state
        .oauth_service
        .upsert_provider(&project_id, payload)
        .await?;
    Ok(ok(provider))
}

#[utoipa::path(
    delete,
    path = "/api/admin/projects/{project_id}/oauth-providers/{provider}",
    tag = "admin-oauth",
    operation_id = "admin_delete_oauth_provider",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("provider" = String, Path, description = "Provider name"),
    ),
    responses((status = 200, description = "Provider removed"))
)]
pub async fn delete_oauth_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, provider)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    state
        .oauth_service
        .delete_provider(&project_id, &provider)
        .await?;
    Ok(ok_message("Provider removed"))
}

// ---------------------------------------------------------------------------
// Rate-limit rules

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}/rate-limit-rules",
    tag = "admin-rate-limits",
    operation_id = "admin_list_rate_limit_rules",
    params(("project_id" = String, Path, description = "Project slug")),
    responses((status = 200, description = "Rules for the project"))
)]
pub async fn list_rate_limit_rules(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let rules = state
        .project_service
        .list_rate_limit_rules(&project_id)
        .await?;
    Ok(ok(rules))
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{project_id}/rate-limit-rules",
    tag = "admin-rate-limits",
    operation_id = "admin_upsert_rate_limit_rule",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = RateLimitRuleReq,
    responses((status = 200, description = "Rule stored", body = RateLimitRuleResp))
)]
pub async fn upsert_rate_limit_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    Json(payload): Json<RateLimitRuleReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let rule = state
        .project_service
        .upsert_rate_limit_rule(&project_id, payload)
        .await?;
    Ok(ok(rule))
}

#[utoipa::path(
    delete,
    path = "/api/admin/projects/{project_id}/rate-limit-rules/{rule_type}",
    tag = "admin-rate-limits",
    operation_id = "admin_delete_rate_limit_rule",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("rule_type" = String, Path, description = "per_ip, per_email or per_project"),
    ),
    responses((status = 200, description = "Rule removed"))
)]
pub async fn delete_rate_limit_rule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((project_id, rule_type)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    state
        .project_service
        .delete_rate_limit_rule(&project_id, &rule_type)
        .await?;
    Ok(ok_message("Rule removed"))
}

// ---------------------------------------------------------------------------
// Email providers & templates

#[utoipa::path(
    get,
    path = "/api/admin/email-providers",
    tag = "admin-email",
    operation_id = "admin_list_email_providers",
    responses((status = 200, description = "Registered providers"))
)]
pub async fn list_email_providers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let providers = state.email_provider_repo.list().await?;
    let redacted: Vec<EmailProviderResp> = providers.into_iter().map(Into::into).collect();
    Ok(ok(redacted))
}

#[utoipa::path(
    post,
    path = "/api/admin/email-providers",
    tag = "admin-email",
    operation_id = "admin_create_email_provider",
    request_body = EmailProviderReq,
    responses((status = 201, description = "Provider registered", body = EmailProviderResp))
)]
pub async fn create_email_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EmailProviderReq>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let provider = EmailProvider {
        id: Uuid::new_v4(),
        provider_type: payload.provider_type,
        config: sqlx::types::Json(payload.config),
        from_email: payload.from_email,
        from_name: payload.from_name,
        is_default: payload.is_default,
        is_fallback: payload.is_fallback,
        enabled: payload.enabled,
        created_at: now,
        updated_at: now,
    };
    let created = state.email_provider_repo.create(&provider).await?;
    Ok((StatusCode::CREATED, ok(EmailProviderResp::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/admin/email-providers/{provider_id}",
    tag = "admin-email",
    operation_id = "admin_update_email_provider",
    params(("provider_id" = Uuid, Path, description = "Provider id")),
    request_body = EmailProviderReq,
    responses((status = 200, description = "Provider updated", body = EmailProviderResp))
)]
pub async fn update_email_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<EmailProviderReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut provider = state
        .email_provider_repo
        .find_by_id(provider_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Email provider not found".to_string()))?;

    provider.provider_type = payload.provider_type;
    provider.config = sqlx::types::Json(payload.config);
    provider.from_email = payload.from_email;
    provider.from_name = payload.from_name;
    provider.is_default = payload.is_default;
    provider.is_fallback = payload.is_fallback;
    provider.enabled = payload.enabled;

    let updated = state.email_provider_repo.update(&provider).await?;
    Ok(ok(EmailProviderResp::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/email-providers/{provider_id}",
    tag = "admin-email",
    operation_id = "admin_delete_email_provider",
    params(("provider_id" = Uuid, Path, description = "Provider id")),
    responses((status = 200, description = "Provider removed"))
)]
pub async fn delete_email_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let deleted = state.email_provider_repo.delete(provider_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Email provider not found".to_string()));
    }
    Ok(ok_message("Provider removed"))
}

#[utoipa::path(
    get,
    path = "/api/admin/projects/{project_id}/email-templates",
    tag = "admin-email",
    operation_id = "admin_list_email_templates",
    params(("project_id" = String, Path, description = "Project slug")),
    responses((status = 200, description = "Project template overrides"))
)]
pub async fn list_email_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let templates = state
        .email_template_repo
        .list_for_project(&project_id)
        .await?;
    let resp: Vec<EmailTemplateResp> = templates.into_iter().map(Into::into).collect();
    Ok(ok(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/email-templates",
    tag = "admin-email",
    operation_id = "admin_list_system_templates",
    responses((status = 200, description = "System default templates"))
)]
pub async fn list_system_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let templates = state.email_template_repo.list_system().await?;
    let resp: Vec<EmailTemplateResp> = templates.into_iter().map(Into::into).collect();
    Ok(ok(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/projects/{project_id}/email-templates",
    tag = "admin-email",
    operation_id = "admin_upsert_email_template",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = EmailTemplateReq,
    responses((status = 200, description = "Template stored", body = EmailTemplateResp))
)]
pub async fn upsert_email_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    Json(payload): Json<EmailTemplateReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let template = EmailTemplate {
        id: Uuid::new_v4(),
        project_id: Some(project_id),
        template_type: payload.template_type,
        subject: payload.subject,
        html_body: payload.html_body,
        text_body: payload.text_body,
        created_at: now,
        updated_at: now,
    };
    let stored = state.email_template_repo.upsert(&template).await?;
    Ok(ok(EmailTemplateResp::from(stored)))
}

#[utoipa::path(
    put,
    path = "/api/admin/email-templates",
    tag = "admin-email",
    operation_id = "admin_upsert_system_template",
    request_body = EmailTemplateReq,
    responses((status = 200, description = "System template stored", body = EmailTemplateResp))
)]
pub async fn upsert_system_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EmailTemplateReq>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let template = EmailTemplate {
        id: Uuid::new_v4(),
        project_id: None,
        template_type: payload.template_type,
        subject: payload.subject,
        html_body: payload.html_body,
        text_body: payload.text_body,
        created_at: now,
        updated_at: now,
    };
    let stored = state.email_template_repo.upsert(&template).await?;
    Ok(ok(EmailTemplateResp::from(stored)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/email-templates/{template_id}",
    tag = "admin-email",
    operation_id = "admin_delete_email_template",
    params(("template_id" = Uuid, Path, description = "Template id")),
    responses((status = 200, description = "Template removed"))
)]
pub async fn delete_email_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(template_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    require_write(&admin)?;
    let deleted = state.email_template_repo.delete(template_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Email template not found".to_string()));
    }
    Ok(ok_message("Template removed"))
}

// ---------------------------------------------------------------------------
// Audit log

#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    tag = "admin-audit",
    operation_id = "admin_query_audit_logs",
    params(
        ("project_id" = Option<String>, Query, description = "Filter by project"),
        ("event_type" = Option<String>, Query, description = "Filter by event type"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by user"),
        ("admin_user_id" = Option<Uuid>, Query, description = "Filter by admin"),
        ("start_date" = Option<String>, Query, description = "RFC 3339 lower bound"),
        ("end_date" = Option<String>, Query, description = "RFC 3339 upper bound"),
        ("limit" = Option<i64>, Query, description = "Page size (default 50, max 500)"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses((status = 200, description = "Matching entries, newest first", body = AuditLogPage))
)]
pub async fn query_audit_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &headers).await?;
    let page = state.audit_log.query(query).await?;
    Ok(ok(page))
}
