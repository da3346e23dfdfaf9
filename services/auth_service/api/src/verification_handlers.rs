use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use auth_service_core::domains::auth::dto::auth_dto::{ConfirmEmailQuery, ErrorResp, UserInfo};
use shared_error::AppError;

use crate::handlers::AppState;
use crate::response::ok;

/// Consume an email-confirmation token
#[utoipa::path(
    get,
    path = "/api/auth/{project_id}/confirm-email",
    tag = "verification",
    operation_id = "confirm_email",
    params(
        ("project_id" = String, Path, description = "Project slug"),
        ("token" = String, Query, description = "Confirmation token"),
    ),
    responses(
        (status = 200, description = "Email confirmed", body = UserInfo),
        (status = 401, description = "Invalid or expired token", body = ErrorResp),
    )
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .email_verification_service
        .confirm_email(&project_id, &query.token)
        .await?;
    Ok(ok(user))
}
