use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domains::oauth::domain::model::{OAuthProviderConfig, PROVIDER_NAMES};

/// Authorization URL response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeUrlResp {
    pub authorization_url: String,

    /// Caller-supplied state, or a generated UUID when absent; the caller
    /// persists it and must present it unchanged on the callback
    pub state: String,
}

/// Query parameters for the authorize redirect
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthorizeQuery {
    pub redirect_uri: String,
    pub state: Option<String>,
}

/// Query parameters for the provider callback
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CallbackQuery {
    pub code: String,
    pub redirect_uri: String,
    pub state: Option<String>,
}

fn validate_provider_name(name: &str) -> Result<(), ValidationError> {
    if PROVIDER_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(ValidationError::new("provider_name"))
    }
}

/// Create or replace an OAuth provider configuration
#[derive(Serialize, Deserialize, ToSchema, Validate)]
pub struct OAuthProviderReq {
    /// google, github, microsoft, apple or custom
    #[validate(custom(function = "validate_provider_name"))]
    #[schema(example = "github")]
    pub provider_name: String,

    #[validate(length(min = 1))]
    pub client_id: String,

    #[validate(length(min = 1))]
    pub client_secret: String,

    #[validate(url)]
    pub authorization_url: String,

    #[validate(url)]
    pub token_url: String,

    #[validate(url)]
    pub userinfo_url: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[schema(value_type = Option<Object>)]
    pub additional_config: Option<serde_json::Value>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Provider configuration as returned to admins (secret redacted)
#[derive(Serialize, Deserialize, ToSchema)]
pub struct OAuthProviderResp {
    pub id: Uuid,
    pub project_id: String,
    pub provider_name: String,
    pub client_id: String,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OAuthProviderConfig> for OAuthProviderResp {
    fn from(c: OAuthProviderConfig) -> Self {
        Self {
            id: c.id,
            project_id: c.project_id,
            provider_name: c.provider_name,
            client_id: c.client_id,
            authorization_url: c.authorization_url,
            token_url: c.token_url,
            userinfo_url: c.userinfo_url,
            scopes: c.scopes.0,
            enabled: c.enabled,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
