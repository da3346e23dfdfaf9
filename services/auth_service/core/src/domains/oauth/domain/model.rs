use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// OAuth provider configuration for one (project, provider) pair
///
/// `client_secret` is stored as an AES-GCM envelope when an engine-wide
/// encryption key is configured, plaintext otherwise.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthProviderConfig {
    pub id: Uuid,
    pub project_id: String,
    /// One of: google, github, microsoft, apple, custom
    pub provider_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: sqlx::types::Json<Vec<String>>,
    pub additional_config: Option<sqlx::types::Json<serde_json::Value>>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PROVIDER_NAMES: &[&str] = &["google", "github", "microsoft", "apple", "custom"];

/// Identity extracted from a provider's userinfo response
///
/// Projection is provider-agnostic over the common claim aliases:
/// email <- `email | mail`, display name <- `name | displayName | login`,
/// provider user id <- `id | sub | oid`.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthIdentity {
    pub provider_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub raw: serde_json::Value,
}

impl OAuthIdentity {
    /// Project an identity out of an arbitrary userinfo JSON document
    pub fn from_userinfo(raw: serde_json::Value) -> Option<Self> {
        let email = pick_string(&raw, &["email", "mail"])?;
        let provider_user_id = pick_id(&raw, &["id", "sub", "oid"])?;
        let display_name = pick_string(&raw, &["name", "displayName", "login"]);

        Some(Self {
            provider_user_id,
            email,
            display_name,
            raw,
        })
    }
}

fn pick_string(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(k).and_then(|v| v.as_str()).map(|s| s.to_string()))
}

/// Provider ids may arrive as JSON numbers (GitHub) or strings
fn pick_id(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        value.get(k).and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}
