use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Project entity (a tenant)
///
/// Each project is an isolated identity realm: its own user table, signing
/// secret, OAuth configuration, rate-limit policies, and email branding.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    /// Human-readable slug derived from the name; primary key
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// One of: development, staging, production
    pub environment: String,
    /// Base64-encoded 32 random bytes; consumed as raw bytes by the HMAC
    pub signing_secret: String,
    pub signing_algorithm: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    /// When false, all end-user auth operations fail
    pub enabled: bool,
    /// Name of this project's dedicated user table (`<id>_users`)
    pub user_table_name: String,
    /// Base URL used to construct email callback links
    pub site_url: Option<String>,
    /// Fully-qualified URLs permitted as OAuth/reset redirects
    pub redirect_allowlist: sqlx::types::Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Decode the signing secret into the raw bytes the HMAC consumes
    pub fn signing_secret_bytes(&self) -> Result<Vec<u8>, shared_error::AppError> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.decode(&self.signing_secret).map_err(|_| {
            shared_error::AppError::Internal("Project signing secret is not valid base64".into())
        })
    }
}

/// Rate-limit rule entity
///
/// One row per (project, rule_type). Exceeding `max_attempts` failed
/// attempts inside `window_seconds` trips the rule.
#[derive(Debug, Clone, FromRow)]
pub struct RateLimitRule {
    pub id: Uuid,
    pub project_id: String,
    /// One of: per_ip, per_email, per_project
    pub rule_type: String,
    pub window_seconds: i64,
    pub max_attempts: i64,
    /// One of: block, delay, captcha (only block is enforced)
    pub action: String,
    pub block_duration_seconds: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RateLimitRule {
    /// Default per-IP rule inserted at project creation: 5 failures / 60 s,
    /// block for 300 s
    pub fn default_per_ip(project_id: &str) -> Self {
        Self::default_rule(project_id, "per_ip", 60, 5, 300)
    }

    /// Default per-email rule: 3 failures / 300 s, block for 900 s
    pub fn default_per_email(project_id: &str) -> Self {
        Self::default_rule(project_id, "per_email", 300, 3, 900)
    }

    fn default_rule(
        project_id: &str,
        rule_type: &str,
        window_seconds: i64,
        max_attempts: i64,
        block_duration_seconds: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            rule_type: rule_type.to_string(),
            window_seconds,
            max_attempts,
            action: "block".to_string(),
            block_duration_seconds,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }
}

pub const ENVIRONMENTS: &[&str] = &["development", "staging", "production"];
pub const RULE_TYPES: &[&str] = &["per_ip", "per_email", "per_project"];
pub const RULE_ACTIONS: &[&str] = &["block", "delay", "captcha"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let per_ip = RateLimitRule::default_per_ip("acme");
        assert_eq!(per_ip.window_seconds, 60);
        assert_eq!(per_ip.max_attempts, 5);
        assert_eq!(per_ip.block_duration_seconds, 300);
        assert!(per_ip.enabled);

        let per_email = RateLimitRule::default_per_email("acme");
        assert_eq!(per_email.window_seconds, 300);
        assert_eq!(per_email.max_attempts, 3);
        assert_eq!(per_email.block_duration_seconds, 900);
    }

    #[test]
    fn test_signing_secret_bytes_round_trip() {
        // "aGVsbG8=" is base64 for "hello"
        let project = Project {
            id: "acme".into(),
            name: "Acme".into(),
            description: None,
            environment: "production".into(),
            signing_secret: "aGVsbG8=".into(),
            signing_algorithm: "HS256".into(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 604_800,
            enabled: true,
            user_table_name: "acme_users".into(),
            site_url: None,
            redirect_allowlist: sqlx::types::Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(project.signing_secret_bytes().unwrap(), b"hello");
    }
}
