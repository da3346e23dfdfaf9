use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domains::project::domain::model::{
    Project, RateLimitRule, ENVIRONMENTS, RULE_ACTIONS, RULE_TYPES,
};
use crate::domains::project::domain::slug;

fn validate_name(name: &str) -> Result<(), ValidationError> {
    slug::validate_project_name(name).map_err(|_| ValidationError::new("project_name"))
}

fn validate_environment(environment: &str) -> Result<(), ValidationError> {
    if ENVIRONMENTS.contains(&environment) {
        Ok(())
    } else {
        Err(ValidationError::new("environment"))
    }
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_access_ttl() -> i64 {
    3600
}

fn default_refresh_ttl() -> i64 {
    604_800
}

/// Create project request
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateProjectReq {
    /// Display name, 3-50 chars of letters, digits, underscore, space, hyphen
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "My Cool App")]
    pub name: String,

    #[schema(example = "Mobile app backend")]
    pub description: Option<String>,

    /// development, staging or production
    #[validate(custom(function = "validate_environment"))]
    #[serde(default = "default_environment")]
    #[schema(example = "production")]
    pub environment: String,

    /// Access token lifetime in seconds
    #[validate(range(min = 60, max = 86400))]
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: i64,

    /// Refresh token lifetime in seconds
    #[validate(range(min = 3600, max = 2592000))]
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_seconds: i64,

    /// Base URL for email callback links; must be an absolute URL
    #[validate(url)]
    #[schema(example = "https://app.example.com")]
    pub site_url: Option<String>,

    /// Fully-qualified URLs permitted as OAuth/reset redirects
    #[serde(default)]
    pub redirect_allowlist: Vec<String>,
}

/// Update project request; absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct UpdateProjectReq {
    pub description: Option<String>,

    #[validate(range(min = 60, max = 86400))]
    pub access_token_ttl_seconds: Option<i64>,

    #[validate(range(min = 3600, max = 2592000))]
    pub refresh_token_ttl_seconds: Option<i64>,

    pub enabled: Option<bool>,

    #[validate(url)]
    pub site_url: Option<String>,

    pub redirect_allowlist: Option<Vec<String>>,
}

/// Project details (signing secret is never returned)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectResp {
    #[schema(example = "my_cool_app")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub environment: String,
    pub signing_algorithm: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub enabled: bool,
    pub user_table_name: String,
    pub site_url: Option<String>,
    pub redirect_allowlist: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResp {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            environment: p.environment,
            signing_algorithm: p.signing_algorithm,
            access_token_ttl_seconds: p.access_token_ttl_seconds,
            refresh_token_ttl_seconds: p.refresh_token_ttl_seconds,
            enabled: p.enabled,
            user_table_name: p.user_table_name,
            site_url: p.site_url,
            redirect_allowlist: p.redirect_allowlist.0,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn validate_rule_type(rule_type: &str) -> Result<(), ValidationError> {
    if RULE_TYPES.contains(&rule_type) {
        Ok(())
    } else {
        Err(ValidationError::new("rule_type"))
    }
}

fn validate_rule_action(action: &str) -> Result<(), ValidationError> {
    if RULE_ACTIONS.contains(&action) {
        Ok(())
    } else {
        Err(ValidationError::new("action"))
    }
}

fn default_action() -> String {
    "block".to_string()
}

/// Create or replace a rate-limit rule
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct RateLimitRuleReq {
    /// per_ip, per_email or per_project
    #[validate(custom(function = "validate_rule_type"))]
    #[schema(example = "per_ip")]
    pub rule_type: String,

    #[validate(range(min = 1, max = 3600))]
    pub window_seconds: i64,

    #[validate(range(min = 1, max = 1000))]
    pub max_attempts: i64,

    /// block, delay or captcha (delay/captcha are accepted but enforced as block)
    #[validate(custom(function = "validate_rule_action"))]
    #[serde(default = "default_action")]
    pub action: String,

    #[validate(range(min = 60, max = 86400))]
    pub block_duration_seconds: i64,

    #[serde(default = "crate::domains::project::dto::project_dto::default_enabled")]
    pub enabled: bool,
}

pub(crate) fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitRuleResp {
    pub id: Uuid,
    pub project_id: String,
    pub rule_type: String,
    pub window_seconds: i64,
    pub max_attempts: i64,
    pub action: String,
    pub block_duration_seconds: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RateLimitRule> for RateLimitRuleResp {
    fn from(r: RateLimitRule) -> Self {
        Self {
            id: r.id,
            project_id: r.project_id,
            rule_type: r.rule_type,
            window_seconds: r.window_seconds,
            max_attempts: r.max_attempts,
            action: r.action,
            block_duration_seconds: r.block_duration_seconds,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_create_project_req_validation() {
        let req = CreateProjectReq {
            name: "My Cool App".into(),
            description: None,
            environment: "production".into(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 604_800,
            site_url: Some("https://app.example.com".into()),
            redirect_allowlist: vec![],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_project_req_rejects_bad_environment() {
        let req = CreateProjectReq {
            name: "My Cool App".into(),
            description: None,
            environment: "qa".into(),
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_seconds: 604_800,
            site_url: None,
            redirect_allowlist: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_project_req_rejects_ttl_out_of_range() {
        let req = CreateProjectReq {
            name: "My Cool App".into(),
            description: None,
            environment: "production".into(),
            access_token_ttl_seconds: 30,
            refresh_token_ttl_seconds: 604_800,
            site_url: None,
            redirect_allowlist: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rule_req_validation() {
        let req = RateLimitRuleReq {
            rule_type: "per_ip".into(),
            window_seconds: 60,
            max_attempts: 5,
            action: "block".into(),
            block_duration_seconds: 300,
            enabled: true,
        };
        assert!(req.validate().is_ok());

        let req = RateLimitRuleReq {
            rule_type: "per_user".into(),
            window_seconds: 60,
            max_attempts: 5,
            action: "block".into(),
            block_duration_seconds: 300,
            enabled: true,
        };
        assert!(req.validate().is_err());
    }
}
