// Library exports for integration tests
pub mod admin_handlers;
pub mod extractors;
pub mod handlers;
pub mod oauth_handlers;
pub mod openapi;
pub mod password_reset_handlers;
pub mod response;
pub mod verification_handlers;

pub use handlers::AppState;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the application router from wired services
pub fn create_router(state: AppState) -> Router {
    // End-user surface, keyed by project slug
    let auth_routes = Router::new()
        .route("/api/auth/{project_id}/register", post(handlers::register))
        .route("/api/auth/{project_id}/login", post(handlers::login))
        .route("/api/auth/{project_id}/refresh", post(handlers::refresh))
        .route("/api/auth/{project_id}/logout", post(handlers::logout))
        .route("/api/auth/{project_id}/me", get(handlers::me))
        .route(
            "/api/auth/{project_id}/forgot-password",
            post(password_reset_handlers::forgot_password),
        )
        .route(
            "/api/auth/{project_id}/reset-password",
            post(password_reset_handlers::reset_password),
        )
        .route(
            "/api/auth/{project_id}/confirm-email",
            get(verification_handlers::confirm_email),
        )
        .route(
            "/api/auth/{project_id}/oauth/{provider}",
            get(oauth_handlers::oauth_authorize),
        )
        .route(
            "/api/auth/{project_id}/oauth/{provider}/callback",
            get(oauth_handlers::oauth_callback),
        );

    // Operator surface, authenticated per-request by X-Admin-Session
    let admin_routes = Router::new()
        .route("/api/admin/login", post(admin_handlers::admin_login))
        .route("/api/admin/logout", post(admin_handlers::admin_logout))
        .route("/api/admin/me", get(admin_handlers::admin_me))
        .route(
            "/api/admin/projects",
            get(admin_handlers::list_projects).post(admin_handlers::create_project),
        )
        .route(
            "/api/admin/projects/{project_id}",
            get(admin_handlers::get_project)
                .put(admin_handlers::update_project)
                .delete(admin_handlers::delete_project),
        )
        .route(
            "/api/admin/projects/{project_id}/rotate-secret",
            post(admin_handlers::rotate_signing_secret),
        )
        .route(
            "/api/admin/projects/{project_id}/users",
            get(admin_handlers::list_project_users),
        )
        .route(
            "/api/admin/projects/{project_id}/users/{user_id}",
            get(admin_handlers::get_project_user).delete(admin_handlers::delete_project_user),
        )
        .route(
            "/api/admin/projects/{project_id}/users/{user_id}/status",
            put(admin_handlers::set_project_user_status),
        )
        .route(
            "/api/admin/admins",
            get(admin_handlers::list_admins).post(admin_handlers::create_admin),
        )
        .route(
            "/api/admin/admins/{admin_id}",
            put(admin_handlers::update_admin).delete(admin_handlers::delete_admin),
        )
        .route(
            "/api/admin/admins/{admin_id}/change-password",
            post(admin_handlers::change_admin_password),
        )
        .route(
            "/api/admin/projects/{project_id}/oauth-providers",
            get(admin_handlers::list_oauth_providers)
                .put(admin_handlers::upsert_oauth_provider),
        )
        .route(
            "/api/admin/projects/{project_id}/oauth-providers/{provider}",
            delete(admin_handlers::delete_oauth_provider),
        )
        .route(
            "/api/admin/projects/{project_id}/rate-limit-rules",
            get(admin_handlers::list_rate_limit_rules)
                .put(admin_handlers::upsert_rate_limit_rule),
        )
        .route(
            "/api/admin/projects/{project_id}/rate-limit-rules/{rule_type}",
            delete(admin_handlers::delete_rate_limit_rule),
        )
        .route(
            "/api/admin/email-providers",
            get(admin_handlers::list_email_providers)
                .post(admin_handlers::create_email_provider),
        )
        .route(
            "/api/admin/email-providers/{provider_id}",
            put(admin_handlers::update_email_provider)
                .delete(admin_handlers::delete_email_provider),
        )
        .route(
            "/api/admin/projects/{project_id}/email-templates",
            get(admin_handlers::list_email_templates)
                .put(admin_handlers::upsert_email_template),
        )
        .route(
            "/api/admin/email-templates",
            get(admin_handlers::list_system_templates)
                .put(admin_handlers::upsert_system_template),
        )
        .route(
            "/api/admin/email-templates/{template_id}",
            delete(admin_handlers::delete_email_template),
        )
        .route(
            "/api/admin/audit-logs",
            get(admin_handlers::query_audit_logs),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(auth_routes)
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
