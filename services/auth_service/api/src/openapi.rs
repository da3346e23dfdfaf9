use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use auth_service_core::domains::admin::dto::admin_dto;
use auth_service_core::domains::audit::domain::model as audit_model;
use auth_service_core::domains::auth::dto::auth_dto;
use auth_service_core::domains::email::dto::email_dto;
use auth_service_core::domains::oauth::dto::oauth_dto;
use auth_service_core::domains::project::dto::project_dto;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_check,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::refresh,
        crate::handlers::logout,
        crate::handlers::me,
        crate::password_reset_handlers::forgot_password,
        crate::password_reset_handlers::reset_password,
        crate::verification_handlers::confirm_email,
        crate::oauth_handlers::oauth_authorize,
        crate::oauth_handlers::oauth_callback,
        crate::admin_handlers::admin_login,
        crate::admin_handlers::admin_logout,
        crate::admin_handlers::admin_me,
        crate::admin_handlers::list_projects,
        crate::admin_handlers::create_project,
        crate::admin_handlers::get_project,
        crate::admin_handlers::update_project,
        crate::admin_handlers::rotate_signing_secret,
        crate::admin_handlers::delete_project,
        crate::admin_handlers::list_project_users,
        crate::admin_handlers::get_project_user,
        crate::admin_handlers::set_project_user_status,
        crate::admin_handlers::delete_project_user,
        crate::admin_handlers::list_admins,
        crate::admin_handlers::create_admin,
        crate::admin_handlers::update_admin,
        crate::admin_handlers::change_admin_password,
        crate::admin_handlers::delete_admin,
        crate::admin_handlers::list_oauth_providers,
        crate::admin_handlers::upsert_oauth_provider,
        crate::admin_handlers::delete_oauth_provider,
        crate::admin_handlers::list_rate_limit_rules,
        crate::admin_handlers::upsert_rate_limit_rule,
        crate::admin_handlers::delete_rate_limit_rule,
        crate::admin_handlers::list_email_providers,
        crate::admin_handlers::create_email_provider,
        crate::admin_handlers::update_email_provider,
        crate::admin_handlers::delete_email_provider,
        crate::admin_handlers::list_email_templates,
        crate::admin_handlers::list_system_templates,
        crate::admin_handlers::upsert_email_template,
        crate::admin_handlers::upsert_system_template,
        crate::admin_handlers::delete_email_template,
        crate::admin_handlers::query_audit_logs,
    ),
    components(schemas(
        auth_dto::ErrorResp,
        auth_dto::HealthResp,
        auth_dto::RegisterReq,
        auth_dto::LoginReq,
        auth_dto::RefreshReq,
        auth_dto::LogoutReq,
        auth_dto::ForgotPasswordReq,
        auth_dto::ForgotPasswordResp,
        auth_dto::ResetPasswordReq,
        auth_dto::TokenPairResp,
        auth_dto::AuthResp,
        auth_dto::UserInfo,
        auth_dto::UserListResp,
        admin_dto::AdminLoginReq,
        admin_dto::AdminLoginResp,
        admin_dto::CreateAdminReq,
        admin_dto::UpdateAdminReq,
        admin_dto::ChangeAdminPasswordReq,
        admin_dto::AdminInfo,
        audit_model::AuditLogEntry,
        audit_model::AuditLogPage,
        email_dto::EmailProviderReq,
        email_dto::EmailProviderResp,
        email_dto::EmailTemplateReq,
        email_dto::EmailTemplateResp,
        oauth_dto::AuthorizeUrlResp,
        oauth_dto::OAuthProviderReq,
        oauth_dto::OAuthProviderResp,
        project_dto::CreateProjectReq,
        project_dto::UpdateProjectReq,
        project_dto::ProjectResp,
        project_dto::RateLimitRuleReq,
        project_dto::RateLimitRuleResp,
    )),
    modifiers(&SecuritySchemes),
    tags(
        (name = "auth", description = "End-user authentication"),
        (name = "password-reset", description = "Password reset flow"),
        (name = "verification", description = "Email confirmation"),
        (name = "oauth", description = "OAuth2 authorization-code flow"),
        (name = "admin-session", description = "Operator sessions"),
        (name = "admin-projects", description = "Project management"),
        (name = "admin-users", description = "Project user management"),
        (name = "admin-accounts", description = "Admin account management"),
        (name = "admin-oauth", description = "OAuth provider configuration"),
        (name = "admin-rate-limits", description = "Rate-limit rules"),
        (name = "admin-email", description = "Email providers and templates"),
        (name = "admin-audit", description = "Audit log"),
    )
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "admin_session",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Session"))),
            );
        }
    }
}
