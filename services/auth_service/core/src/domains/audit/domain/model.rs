use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Audit event to be appended
///
/// `event_type` is a free-form tag (`user_created`, `login_failed`,
/// `refresh_reuse_detected`, ...). `project_id` is None for system-wide
/// events such as admin logins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub project_id: Option<String>,
    pub event_type: String,
    /// One of: success, failure, warning
    pub event_status: String,
    pub user_id: Option<Uuid>,
    pub admin_user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub event_data: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn success(project_id: Option<&str>, event_type: &str) -> Self {
        Self::with_status(project_id, event_type, "success")
    }

    pub fn failure(project_id: Option<&str>, event_type: &str) -> Self {
        Self::with_status(project_id, event_type, "failure")
    }

    pub fn warning(project_id: Option<&str>, event_type: &str) -> Self {
        Self::with_status(project_id, event_type, "warning")
    }

    fn with_status(project_id: Option<&str>, event_type: &str, status: &str) -> Self {
        Self {
            project_id: project_id.map(|s| s.to_string()),
            event_type: event_type.to_string(),
            event_status: status.to_string(),
            user_id: None,
            admin_user_id: None,
            ip_address: None,
            user_agent: None,
            event_data: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_admin(mut self, admin_user_id: Uuid) -> Self {
        self.admin_user_id = Some(admin_user_id);
        self
    }

    pub fn with_request_context(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.event_data = Some(data);
        self
    }
}

/// Stored audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub project_id: Option<String>,
    pub event_type: String,
    pub event_status: String,
    pub user_id: Option<Uuid>,
    pub admin_user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[schema(value_type = Object)]
    pub event_data: Option<sqlx::types::Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// Filter-and-paginate query over the audit log
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AuditLogQuery {
    pub project_id: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<Uuid>,
    pub admin_user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditLogQuery {
    /// Clamp limit/offset to sane bounds
    pub fn normalized(mut self) -> Self {
        self.limit = Some(self.limit.unwrap_or(50).clamp(1, 500));
        self.offset = Some(self.offset.unwrap_or(0).max(0));
        self
    }
}

/// Paginated audit log response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builders() {
        let event = AuditEvent::success(Some("acme"), "user_created")
            .with_user(Uuid::new_v4())
            .with_request_context(Some("203.0.113.1".into()), None)
            .with_data(serde_json::json!({"email": "a@x.com"}));

        assert_eq!(event.project_id.as_deref(), Some("acme"));
        assert_eq!(event.event_type, "user_created");
        assert_eq!(event.event_status, "success");
        assert!(event.user_id.is_some());
        assert!(event.event_data.is_some());
    }

    #[test]
    fn test_system_wide_event_has_no_project() {
        let event = AuditEvent::failure(None, "admin_login_failed");
        assert!(event.project_id.is_none());
        assert_eq!(event.event_status, "failure");
    }

    #[test]
    fn test_query_normalization() {
        let query = AuditLogQuery::default().normalized();
        assert_eq!(query.limit, Some(50));
        assert_eq!(query.offset, Some(0));

        let query = AuditLogQuery {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.limit, Some(500));
        assert_eq!(query.offset, Some(0));
    }
}
