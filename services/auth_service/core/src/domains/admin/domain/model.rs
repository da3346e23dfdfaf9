use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Operator identity
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    /// One of: super_admin, admin, viewer
    pub role: String,
    pub enabled: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const ADMIN_ROLES: &[&str] = &["super_admin", "admin", "viewer"];

impl AdminUser {
    pub fn can_write(&self) -> bool {
        matches!(self.role.as_str(), "super_admin" | "admin")
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == "super_admin"
    }
}

/// Admin session, keyed by SHA-256 of an opaque bearer token
///
/// Expiry is sliding: each verified request pushes `expires_at` another 30
/// minutes out.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSession {
    pub id: Uuid,
    pub admin_user_id: Uuid,
    pub token_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(
        admin_user_id: Uuid,
        token_hash: String,
        lifetime_minutes: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            admin_user_id,
            token_hash,
            ip_address,
            user_agent,
            expires_at: now + chrono::Duration::minutes(lifetime_minutes),
            last_activity_at: now,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        let mut admin = AdminUser {
            id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            password_hash: "hash".into(),
            name: None,
            role: "viewer".into(),
            enabled: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!admin.can_write());
        assert!(!admin.is_super_admin());

        admin.role = "admin".into();
        assert!(admin.can_write());
        assert!(!admin.is_super_admin());

        admin.role = "super_admin".into();
        assert!(admin.can_write());
        assert!(admin.is_super_admin());
    }

    #[test]
    fn test_session_expiry() {
        let session = AdminSession::new(Uuid::new_v4(), "hash".into(), 30, None, None);
        assert!(!session.is_expired());

        let mut stale = session.clone();
        stale.expires_at = Utc::now() - chrono::Duration::minutes(1);
        assert!(stale.is_expired());
    }
}
