use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use auth_service_core::domains::auth::dto::auth_dto::{
    ErrorResp, ForgotPasswordReq, ForgotPasswordResp, ResetPasswordReq,
};
use shared_error::AppError;

use crate::extractors::ClientInfo;
use crate::handlers::AppState;
use crate::response::{ok, ok_message};

/// Request a password reset link
///
/// Always succeeds, whether or not the email maps to an account.
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/forgot-password",
    tag = "password-reset",
    operation_id = "forgot_password",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = ForgotPasswordResp),
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    ClientInfo(meta): ClientInfo,
    Json(payload): Json<ForgotPasswordReq>,
) -> Result<Json<Value>, AppError> {
    let resp = state
        .password_reset_service
        .request_reset(&project_id, &payload.email, meta)
        .await?;
    Ok(ok(resp))
}

/// Consume a reset token and set a new password
#[utoipa::path(
    post,
    path = "/api/auth/{project_id}/reset-password",
    tag = "password-reset",
    operation_id = "reset_password",
    params(("project_id" = String, Path, description = "Project slug")),
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Password policy violated", body = ErrorResp),
        (status = 401, description = "Invalid or expired token", body = ErrorResp),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(payload): Json<ResetPasswordReq>,
) -> Result<Json<Value>, AppError> {
    state
        .password_reset_service
        .reset_password(&project_id, &payload.token, &payload.new_password)
        .await?;
    Ok(ok_message("Password has been reset"))
}
