use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domains::admin::domain::model::{AdminUser, ADMIN_ROLES};

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if ADMIN_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ValidationError::new("role"))
    }
}

/// Admin login request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct AdminLoginReq {
    #[validate(email)]
    #[schema(example = "ops@example.com")]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Admin login response; the session token is returned exactly once
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResp {
    /// Opaque bearer token for the X-Admin-Session header
    pub session_token: String,

    /// Session expiry (slides forward on every verified request)
    pub expires_at: DateTime<Utc>,

    pub admin: AdminInfo,
}

/// Create admin request
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateAdminReq {
    #[validate(email)]
    pub email: String,

    /// 12-72 characters
    #[validate(length(min = 12, max = 72))]
    pub password: String,

    pub name: Option<String>,

    /// super_admin, admin or viewer
    #[validate(custom(function = "validate_role"))]
    #[schema(example = "admin")]
    pub role: String,
}

/// Update admin request; absent fields are left unchanged
#[derive(Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct UpdateAdminReq {
    pub name: Option<String>,

    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,

    pub enabled: Option<bool>,
}

/// Change admin password; the target's current password is always required
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct ChangeAdminPasswordReq {
    #[validate(length(min = 1))]
    pub current_password: String,

    #[validate(length(min = 12, max = 72))]
    pub new_password: String,
}

/// Admin details (password hash never leaves the service)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminUser> for AdminInfo {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
            enabled: admin.enabled,
            last_login_at: admin.last_login_at,
            created_at: admin.created_at,
        }
    }
}

impl AdminInfo {
    pub fn can_write(&self) -> bool {
        matches!(self.role.as_str(), "super_admin" | "admin")
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == "super_admin"
    }
}
