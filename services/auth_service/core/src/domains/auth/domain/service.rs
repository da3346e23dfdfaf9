use async_trait::async_trait;
use shared_error::AppError;
use shared_jwt::Claims;
use uuid::Uuid;

use crate::domains::auth::dto::auth_dto::{
    AuthResp, ForgotPasswordResp, LoginReq, RegisterReq, RequestMeta, TokenPairResp, UserInfo,
    UserListResp,
};

/// Auth engine
///
/// Composes storage, rate limiting, token services, password hashing and
/// signed-token minting for the end-user flows.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(
        &self,
        project_id: &str,
        req: RegisterReq,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError>;

    async fn login(
        &self,
        project_id: &str,
        req: LoginReq,
        meta: RequestMeta,
    ) -> Result<AuthResp, AppError>;

    /// Validate a bearer access token against the project's current signing
    /// secret; rejects tokens minted for another project
    async fn verify_access_token(
        &self,
        project_id: &str,
        token: &str,
    ) -> Result<Claims, AppError>;

    /// Rotate a refresh token: the presented token is single-use
    async fn refresh(
        &self,
        project_id: &str,
        refresh_token: &str,
        meta: RequestMeta,
    ) -> Result<TokenPairResp, AppError>;

    async fn logout(&self, project_id: &str, refresh_token: &str) -> Result<(), AppError>;

    async fn revoke_all_user_tokens(
        &self,
        project_id: &str,
        user_id: Uuid,
    ) -> Result<u64, AppError>;

    async fn get_user(&self, project_id: &str, user_id: Uuid) -> Result<UserInfo, AppError>;

    /// Paginated user listing (admin surface)
    async fn list_users(
        &self,
        project_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<UserListResp, AppError>;

    /// Transition a user's status (active/suspended/deleted); leaving the
    /// active state revokes the user's refresh tokens
    async fn set_user_status(
        &self,
        project_id: &str,
        user_id: Uuid,
        status: &str,
    ) -> Result<UserInfo, AppError>;
}

/// Password-reset token machinery
#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Always resolves successfully regardless of whether the email maps to
    /// an account (no enumeration)
    async fn request_reset(
        &self,
        project_id: &str,
        email: &str,
        meta: RequestMeta,
    ) -> Result<ForgotPasswordResp, AppError>;

    async fn reset_password(
        &self,
        project_id: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Mark all of a user's outstanding reset tokens as used
    async fn revoke_user_tokens(&self, project_id: &str, user_id: Uuid)
        -> Result<u64, AppError>;

    /// Delete tokens expired for more than a day
    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError>;
}

/// Email-confirmation token machinery; same storage shape as reset with a
/// 24-hour TTL, consuming sets `email_verified`
#[async_trait]
pub trait EmailVerificationService: Send + Sync {
    async fn send_confirmation(&self, project_id: &str, user_id: Uuid) -> Result<(), AppError>;

    async fn confirm_email(&self, project_id: &str, token: &str) -> Result<UserInfo, AppError>;

    async fn cleanup_expired_tokens(&self) -> Result<u64, AppError>;
}
