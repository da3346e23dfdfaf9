use async_trait::async_trait;
use shared_error::AppError;
use uuid::Uuid;

use crate::domains::admin::dto::admin_dto::{
    AdminInfo, AdminLoginReq, AdminLoginResp, ChangeAdminPasswordReq, CreateAdminReq,
    UpdateAdminReq,
};
use crate::domains::auth::dto::auth_dto::RequestMeta;

/// Admin session service
///
/// An isolated variant of the auth engine for operator authentication; opaque
/// bearer tokens with sliding 30-minute expiry, no JWTs.
#[async_trait]
pub trait AdminAuthService: Send + Sync {
    async fn login(
        &self,
        req: AdminLoginReq,
        meta: RequestMeta,
    ) -> Result<AdminLoginResp, AppError>;

    /// Verify a presented session token; on success the expiry slides
    /// forward and the admin is returned
    async fn verify_session(&self, token: &str) -> Result<AdminInfo, AppError>;

    async fn logout(&self, token: &str) -> Result<(), AppError>;

    async fn create_admin(&self, req: CreateAdminReq) -> Result<AdminInfo, AppError>;

    async fn update_admin(&self, id: Uuid, req: UpdateAdminReq) -> Result<AdminInfo, AppError>;

    /// Self-service semantics: requires the target admin's current password,
    /// whoever the caller is
    async fn change_password(
        &self,
        id: Uuid,
        req: ChangeAdminPasswordReq,
    ) -> Result<(), AppError>;

    async fn list_admins(&self) -> Result<Vec<AdminInfo>, AppError>;

    async fn get_admin(&self, id: Uuid) -> Result<AdminInfo, AppError>;

    async fn delete_admin(&self, id: Uuid) -> Result<(), AppError>;
}
