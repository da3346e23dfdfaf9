use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use auth_service_core::domains::auth::dto::auth_dto::{AuthResp, ErrorResp};
use auth_service_core::domains::oauth::dto::oauth_dto::{
    AuthorizeQuery, AuthorizeUrlResp, CallbackQuery,
};
use shared_error::AppError;

use crate::extractors::ClientInfo;
use crate::handlers::AppState;
use crate::response::ok;

/// Build the provider authorization URL for the caller to redirect to
#[utoipa::path(
    get,
    path = "/api/auth/{project_id}/oauth/{provider}",
    tag = "oauth",
    operation_id = "oauth_authorize",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("provider" = String, Path, description = "Provider name"),
        ("redirect_uri" = String, Query, description = "Callback redirect URI"),
        ("state" = Option<String>, Query, description = "Caller state; generated when absent"),
    ),
    responses(
        (status = 200, description = "Authorization URL", body = AuthorizeUrlResp),
        (status = 400, description = "Redirect URI not allowed", body = ErrorResp),
        (status = 404, description = "Provider not configured", body = ErrorResp),
    )
)]
pub async fn oauth_authorize(
    State(state): State<AppState>,
    Path((project_id, provider)): Path<(String, String)>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<Value>, AppError> {
    let resp = state
        .oauth_service
        .authorization_url(&project_id, &provider, &query.redirect_uri, query.state)
        .await?;
    Ok(ok(resp))
}

/// Exchange the provider callback code for a local token pair
#[utoipa::path(
    get,
    path = "/api/auth/{project_id}/oauth/{provider}/callback",
    tag = "oauth",
    operation_id = "oauth_callback",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("provider" = String, Path, description = "Provider name"),
        ("code" = String, Query, description = "Authorization code"),
        ("redirect_uri" = String, Query, description = "Redirect URI used for the exchange"),
    ),
    responses(
        (status = 200, description = "Authentication successful", body = AuthResp),
        (status = 400, description = "Exchange or userinfo failed", body = ErrorResp),
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path((project_id, provider)): Path<(String, String)>,
    ClientInfo(meta): ClientInfo,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, AppError> {
    let resp = state
        .oauth_service
        .handle_callback(&project_id, &provider, &query.code, &query.redirect_uri, meta)
        .await?;
    Ok(ok(resp))
}
